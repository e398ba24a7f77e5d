//! Vertex + optional index buffer pair

use super::buffer::{IndexBuffer, VertexBuffer};
use super::gpu::Gpu;
use super::vertex::{Vertex, VertexType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// A drawable mesh: one vertex buffer, optionally indexed
#[derive(Debug)]
pub struct Mesh {
    vertex_buffer: VertexBuffer,
    index_buffer: Option<IndexBuffer>,
    topology: Topology,
}

impl Mesh {
    pub fn new(vertex_buffer: VertexBuffer, index_buffer: Option<IndexBuffer>, topology: Topology) -> Self {
        Self {
            vertex_buffer,
            index_buffer,
            topology,
        }
    }

    /// Indexed triangle mesh from vertices and `u16` indices
    pub fn from_u16<V: VertexType>(name: &str, vertices: &[V], indices: &[u16]) -> Self {
        Self::new(
            VertexBuffer::new(name, vertices),
            Some(IndexBuffer::from_u16(name, indices)),
            Topology::Triangles,
        )
    }

    /// Indexed triangle mesh from vertices and `u32` indices
    pub fn from_u32<V: VertexType>(name: &str, vertices: &[V], indices: &[u32]) -> Self {
        Self::new(
            VertexBuffer::new(name, vertices),
            Some(IndexBuffer::from_u32(name, indices)),
            Topology::Triangles,
        )
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> Option<&IndexBuffer> {
        self.index_buffer.as_ref()
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Number of indices, or vertices when not indexed
    pub fn element_count(&self) -> u32 {
        self.index_buffer
            .as_ref()
            .map_or(self.vertex_buffer.count(), IndexBuffer::count)
    }

    pub fn upload(&mut self, gpu: &Gpu) {
        self.vertex_buffer.upload(gpu);
        if let Some(index_buffer) = &mut self.index_buffer {
            index_buffer.upload(gpu);
        }
    }

    /// Check if the mesh has been uploaded to GPU
    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_uploaded()
            && self.index_buffer.as_ref().is_none_or(IndexBuffer::is_uploaded)
    }

    /// Unit quad on the XY plane facing +Z, centered at origin
    pub fn plane(name: &str) -> Self {
        let normal = [0.0, 0.0, 1.0];
        let vertices = [
            Vertex::new([-0.5, -0.5, 0.0], normal, [0.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.0], normal, [1.0, 1.0]),
            Vertex::new([0.5, 0.5, 0.0], normal, [1.0, 0.0]),
            Vertex::new([-0.5, 0.5, 0.0], normal, [0.0, 0.0]),
        ];
        Self::from_u16(name, &vertices, &[0, 1, 2, 2, 3, 0])
    }

    /// Square grid on the XZ plane spanning `[0, size]`, `cells` quads per side
    pub fn grid(name: &str, size: f32, cells: u32) -> Self {
        let cells = cells.max(1);
        let step = size / cells as f32;
        let mut vertices = Vec::with_capacity(((cells + 1) * (cells + 1)) as usize);
        for z in 0..=cells {
            for x in 0..=cells {
                vertices.push(Vertex::new(
                    [x as f32 * step, 0.0, z as f32 * step],
                    [0.0, 1.0, 0.0],
                    [x as f32 / cells as f32, z as f32 / cells as f32],
                ));
            }
        }

        let row = cells + 1;
        let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
        for z in 0..cells {
            for x in 0..cells {
                let i = z * row + x;
                indices.extend([i, i + row, i + 1, i + 1, i + row, i + row + 1]);
            }
        }

        Self::from_u32(name, &vertices, &indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane() {
        let plane = Mesh::plane("plane");
        assert_eq!(plane.vertex_buffer().count(), 4);
        assert_eq!(plane.element_count(), 6);
        assert_eq!(plane.topology(), Topology::Triangles);
        assert!(!plane.is_uploaded());
    }

    #[test]
    fn test_grid_counts() {
        let grid = Mesh::grid("grid", 10.0, 4);
        assert_eq!(grid.vertex_buffer().count(), 25);
        assert_eq!(grid.element_count(), 4 * 4 * 6);
        let max_index = grid.index_buffer().unwrap().indices().into_iter().max().unwrap();
        assert_eq!(max_index, 24);
    }
}
