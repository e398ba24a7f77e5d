//! Vertex formats and their buffer layouts

use bytemuck::{Pod, Zeroable};

/// Static description of one interleaved vertex format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Stable name, part of the pipeline cache key
    pub name: &'static str,
    pub stride: wgpu::BufferAddress,
    pub attributes: &'static [wgpu::VertexAttribute],
}

impl VertexLayout {
    /// Get the vertex buffer layout for wgpu
    pub fn buffer_layout(&self, step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode,
            attributes: self.attributes,
        }
    }
}

/// A `Pod` vertex with a known layout
pub trait VertexType: Pod {
    const LAYOUT: VertexLayout;
}

/// Vertex with position, normal, and UV coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

impl VertexType for Vertex {
    const LAYOUT: VertexLayout = VertexLayout {
        name: "basic",
        stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3, // position
            1 => Float32x3, // normal
            2 => Float32x2, // uv
        ],
    };
}

/// Model vertex with a two-slot bone index
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
    /// Second slot is reserved for two-bone blending and stays -1
    pub bone_indices: [i32; 2],
}

impl VertexType for ModelVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        name: "model",
        stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3, // position
            1 => Float32x2, // tex coord
            2 => Float32x3, // normal
            3 => Sint32x2,  // bone indices
        ],
    };
}

/// Colored line vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

impl LineVertex {
    pub fn new(position: glam::Vec3, color: glam::Vec4) -> Self {
        Self {
            position: position.extend(1.0).to_array(),
            color: color.to_array(),
        }
    }
}

impl VertexType for LineVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        name: "line",
        stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x4, // position
            1 => Float32x4, // color
        ],
    };
}

/// Landscape footprint vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FootprintVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl VertexType for FootprintVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        name: "footprint",
        stride: std::mem::size_of::<FootprintVertex>() as wgpu::BufferAddress,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3, // position
            1 => Float32x2, // tex coord
        ],
    };
}

/// Per-instance model matrix, one column per attribute
pub const INSTANCE_LAYOUT: VertexLayout = VertexLayout {
    name: "instance",
    stride: std::mem::size_of::<[[f32; 4]; 4]>() as wgpu::BufferAddress,
    attributes: &wgpu::vertex_attr_array![
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
        11 => Float32x4,
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_match_struct_sizes() {
        assert_eq!(Vertex::LAYOUT.stride, 32);
        assert_eq!(ModelVertex::LAYOUT.stride, 40);
        assert_eq!(LineVertex::LAYOUT.stride, 32);
        assert_eq!(FootprintVertex::LAYOUT.stride, 20);
        assert_eq!(INSTANCE_LAYOUT.stride, 64);
    }

    #[test]
    fn test_model_vertex_attribute_offsets() {
        let offsets: Vec<_> = ModelVertex::LAYOUT
            .attributes
            .iter()
            .map(|a| a.offset)
            .collect();
        assert_eq!(offsets, vec![0, 12, 20, 32]);
    }
}
