//! 2D (array) textures
//!
//! Every texture is sampled through a `D2Array` view so single textures and
//! layered albedo arrays share one binding type in the shaders.

use std::path::Path;

use image::GenericImageView;
use wgpu::util::DeviceExt;

use super::gpu::{Gpu, next_resource_id};

/// Errors that can occur during texture creation
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("expected {expected} bytes of RGBA data for {width}x{height}x{layers}, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        layers: u32,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Sampled only, created from pixel data
    Sampled,
    /// Color attachment of a frame buffer, also sampled
    RenderTarget,
}

/// Backend objects of an uploaded texture
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    /// `D2Array` view used for sampling
    pub view: wgpu::TextureView,
    /// Single layer view used as a render attachment
    pub attachment_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

#[derive(Debug)]
pub struct Texture2D {
    id: u64,
    name: String,
    width: u32,
    height: u32,
    layers: u32,
    usage: TextureUsage,
    /// RGBA8 pixel data, layer-major; empty for render targets
    pixels: Vec<u8>,
    pub(crate) gpu: Option<GpuTexture>,
}

pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

impl Texture2D {
    /// Create a texture from raw RGBA data
    pub fn from_rgba(
        name: impl Into<String>,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, TextureError> {
        Self::from_rgba_layers(name, width, height, 1, rgba)
    }

    /// Create a layered texture from raw RGBA data, layer after layer
    pub fn from_rgba_layers(
        name: impl Into<String>,
        width: u32,
        height: u32,
        layers: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, TextureError> {
        let expected = (width * height * layers * 4) as usize;
        if rgba.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                layers,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            id: next_resource_id(),
            name: name.into(),
            width,
            height,
            layers,
            usage: TextureUsage::Sampled,
            pixels: rgba,
            gpu: None,
        })
    }

    /// Load a texture from encoded bytes (PNG)
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?;
        let (width, height) = img.dimensions();
        Self::from_rgba(name, width, height, img.to_rgba8().into_raw())
    }

    /// Load a texture from a file path
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_bytes(path.display().to_string(), &bytes)
    }

    /// 1x1 texture of one color
    pub fn solid_color(name: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            id: next_resource_id(),
            name: name.into(),
            width: 1,
            height: 1,
            layers: 1,
            usage: TextureUsage::Sampled,
            pixels: color.to_vec(),
            gpu: None,
        }
    }

    /// Color target with no initial contents
    pub fn render_target(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: next_resource_id(),
            name: name.into(),
            width,
            height,
            layers: 1,
            usage: TextureUsage::RenderTarget,
            pixels: Vec::new(),
            gpu: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Create the GPU texture, view and sampler
    pub fn upload(&mut self, gpu: &Gpu) {
        let size = wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.layers,
        };
        let descriptor = wgpu::TextureDescriptor {
            label: Some(&self.name),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: match self.usage {
                TextureUsage::Sampled => {
                    wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST
                }
                TextureUsage::RenderTarget => {
                    wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::COPY_SRC
                }
            },
            view_formats: &[],
        };

        let texture = match self.usage {
            TextureUsage::Sampled => gpu.device.create_texture_with_data(
                &gpu.queue,
                &descriptor,
                wgpu::util::TextureDataOrder::LayerMajor,
                &self.pixels,
            ),
            TextureUsage::RenderTarget => gpu.device.create_texture(&descriptor),
        };

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let attachment_view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D2),
            array_layer_count: Some(1),
            ..Default::default()
        });

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        self.gpu = Some(GpuTexture {
            texture,
            view,
            attachment_view,
            sampler,
        });
        log::debug!(
            "Uploaded texture {} ({}x{}x{})",
            self.name,
            self.width,
            self.height,
            self.layers
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_size() {
        let ok = Texture2D::from_rgba("ok", 2, 2, vec![0; 16]);
        assert!(ok.is_ok());

        let err = Texture2D::from_rgba("bad", 2, 2, vec![0; 15]);
        assert!(matches!(err, Err(TextureError::SizeMismatch { expected: 16, actual: 15, .. })));
    }

    #[test]
    fn test_layers() {
        let texture = Texture2D::from_rgba_layers("array", 1, 1, 3, vec![255; 12]).unwrap();
        assert_eq!(texture.layers(), 3);
        assert_eq!(texture.usage(), TextureUsage::Sampled);
        assert!(!texture.is_uploaded());
    }

    #[test]
    fn test_unique_ids() {
        let a = Texture2D::solid_color("a", [0, 0, 0, 255]);
        let b = Texture2D::solid_color("b", [0, 0, 0, 255]);
        assert_ne!(a.id(), b.id());
    }
}
