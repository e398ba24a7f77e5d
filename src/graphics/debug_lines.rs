//! Line-list meshes for debug overlays

use glam::{Vec3, Vec4};

use super::buffer::VertexBuffer;
use super::mesh::{Mesh, Topology};
use super::vertex::LineVertex;

/// Line-list mesh from vertex pairs
pub fn create_lines(name: &str, vertices: &[LineVertex]) -> Mesh {
    debug_assert!(vertices.len() % 2 == 0, "line list needs vertex pairs");
    Mesh::new(VertexBuffer::new(name, vertices), None, Topology::Lines)
}

/// Single segment
pub fn create_line(from: Vec3, to: Vec3, color: Vec4) -> Mesh {
    create_lines(
        "debug line",
        &[LineVertex::new(from, color), LineVertex::new(to, color)],
    )
}

/// Three unit axes through the origin colored X red, Y green, Z blue
pub fn create_cross() -> Mesh {
    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
    let green = Vec4::new(0.0, 1.0, 0.0, 1.0);
    let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);
    create_lines(
        "debug cross",
        &[
            LineVertex::new(Vec3::new(0.5, 0.0, 0.0), red),
            LineVertex::new(Vec3::new(-0.5, 0.0, 0.0), red),
            LineVertex::new(Vec3::new(0.0, 0.5, 0.0), green),
            LineVertex::new(Vec3::new(0.0, -0.5, 0.0), green),
            LineVertex::new(Vec3::new(0.0, 0.0, 0.5), blue),
            LineVertex::new(Vec3::new(0.0, 0.0, -0.5), blue),
        ],
    )
}

/// Twelve edges of the unit cube centered at the origin
pub fn create_box(color: Vec4) -> Mesh {
    let mut vertices = Vec::with_capacity(24);
    let corner = |x: f32, y: f32, z: f32| LineVertex::new(Vec3::new(x, y, z) * 0.5, color);
    for z in [-1.0, 1.0] {
        // Two horizontal and two vertical edges of each z face
        let edges = [
            ((-1.0, 1.0), (1.0, 1.0)),
            ((-1.0, -1.0), (1.0, -1.0)),
            ((-1.0, 1.0), (-1.0, -1.0)),
            ((1.0, 1.0), (1.0, -1.0)),
        ];
        for (a, b) in edges {
            vertices.push(corner(a.0, a.1, z));
            vertices.push(corner(b.0, b.1, z));
        }
    }
    // Edges joining the two faces
    for (x, y) in [(-1.0, 1.0), (-1.0, -1.0), (1.0, 1.0), (1.0, -1.0)] {
        vertices.push(corner(x, y, -1.0));
        vertices.push(corner(x, y, 1.0));
    }
    create_lines("debug box", &vertices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_has_twelve_unit_edges() {
        let mesh = create_box(Vec4::ONE);
        let vertices = mesh.vertex_buffer().vertices::<LineVertex>();
        assert_eq!(vertices.len(), 24);
        assert_eq!(mesh.topology(), Topology::Lines);
        for pair in vertices.chunks(2) {
            let a = Vec4::from_array(pair[0].position).truncate();
            let b = Vec4::from_array(pair[1].position).truncate();
            assert!(((a - b).length() - 1.0).abs() < 0.0001);
            assert!(a.abs().max_element() <= 0.5 + f32::EPSILON);
        }
    }

    #[test]
    fn test_cross_axes() {
        let mesh = create_cross();
        let vertices = mesh.vertex_buffer().vertices::<LineVertex>();
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[2].color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(mesh.element_count(), 6);
    }
}
