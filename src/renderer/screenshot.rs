//! Back buffer readback to PNG

use std::path::{Path, PathBuf};

use super::context::RendererError;
use crate::graphics::Gpu;

/// A surface copy recorded into the frame's command buffer
pub(crate) struct Readback {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    padded_row: u32,
    bgra: bool,
    path: PathBuf,
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

impl Readback {
    /// Copy `texture` into a mappable buffer. Only PNG output is supported.
    pub fn record(
        gpu: &Gpu,
        commands: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
        path: PathBuf,
    ) -> Option<Self> {
        if !is_png(&path) {
            log::warn!("Screenshot format of {} is not supported, use .png", path.display());
            return None;
        }
        let format = texture.format();
        let bgra = match format {
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
            other => {
                log::warn!("Cannot read back a {other:?} surface");
                return None;
            }
        };

        let (width, height) = (texture.width(), texture.height());
        let padded_row = (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screenshot Readback"),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        commands.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        Some(Self {
            buffer,
            width,
            height,
            padded_row,
            bgra,
            path,
        })
    }

    /// Wait for the copy and write the image. Call after the frame is submitted.
    pub fn save(self, gpu: &Gpu) -> Result<PathBuf, RendererError> {
        let slice = self.buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        receiver.recv().map_err(|_| RendererError::ReadbackDropped)??;

        let pixels = {
            let mapped = slice.get_mapped_range();
            let pixels = unpad_rows(&mapped, self.width, self.padded_row, self.bgra);
            drop(mapped);
            pixels
        };
        self.buffer.unmap();

        image::save_buffer_with_format(
            &self.path,
            &pixels,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        log::info!("Saved screenshot {}", self.path.display());
        Ok(self.path)
    }
}

/// Strip row padding, swizzle to RGBA and force opaque alpha
fn unpad_rows(data: &[u8], width: u32, padded_row: u32, bgra: bool) -> Vec<u8> {
    let row = (width * 4) as usize;
    let mut pixels = Vec::with_capacity(row * data.len() / padded_row as usize);
    for chunk in data.chunks(padded_row as usize) {
        for texel in chunk[..row.min(chunk.len())].chunks_exact(4) {
            let (r, b) = if bgra { (texel[2], texel[0]) } else { (texel[0], texel[2]) };
            pixels.extend([r, texel[1], b, 255]);
        }
    }
    pixels
}
