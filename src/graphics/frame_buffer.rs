//! Off-screen render targets

use super::gpu::{Gpu, next_resource_id};
use super::texture::Texture2D;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Color + depth target for an off-screen pass
#[derive(Debug)]
pub struct FrameBuffer {
    id: u64,
    name: String,
    color: Texture2D,
    has_depth: bool,
    pub(crate) depth: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl FrameBuffer {
    pub fn new(name: impl Into<String>, width: u32, height: u32, has_depth: bool) -> Self {
        let name = name.into();
        Self {
            id: next_resource_id(),
            color: Texture2D::render_target(format!("{name} color"), width, height),
            name,
            has_depth,
            depth: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (u32, u32) {
        (self.color.width(), self.color.height())
    }

    /// Color attachment, sampleable by later passes
    pub fn color_attachment(&self) -> &Texture2D {
        &self.color
    }

    pub fn has_depth(&self) -> bool {
        self.has_depth
    }

    pub fn is_uploaded(&self) -> bool {
        self.color.is_uploaded()
    }

    pub fn upload(&mut self, gpu: &Gpu) {
        self.color.upload(gpu);
        if self.has_depth {
            self.depth = Some(create_depth_texture(
                &gpu.device,
                self.color.width(),
                self.color.height(),
            ));
        }
    }
}

pub(crate) fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    (texture, view)
}
