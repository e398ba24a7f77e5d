//! One submesh of a model, merged into a single GPU mesh

use glam::Vec3;

use crate::graphics::{Gpu, Mesh, ModelVertex};
use crate::l3d::{L3dFile, SubmeshFlags};

use super::bounding_box::AxisAlignedBoundingBox;
use super::primitive::Primitive;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubMeshError {
    #[error("submesh {0} is out of range")]
    OutOfRange(usize),
    #[error("submesh {0} has no vertices")]
    NoVertices(usize),
    #[error("submesh {0} has no indices")]
    NoIndices(usize),
}

#[derive(Debug)]
pub struct L3dSubMesh {
    /// Name of the owning model, for diagnostics
    owner: String,
    index: usize,
    flags: SubmeshFlags,
    mesh: Mesh,
    primitives: Vec<Primitive>,
    bounding_box: AxisAlignedBoundingBox,
}

impl L3dSubMesh {
    /// Build submesh `index` of `file`.
    ///
    /// All primitives share one vertex buffer; their indices are rebased onto
    /// it and each primitive keeps its index range.
    pub fn load(file: &L3dFile, index: usize, owner: &str) -> Result<Self, SubMeshError> {
        let header = file
            .submesh_headers()
            .get(index)
            .ok_or(SubMeshError::OutOfRange(index))?;
        let primitive_headers = file.primitive_span(index);

        let num_vertices: u32 = primitive_headers.iter().map(|p| p.num_vertices).sum();
        let num_indices: u32 = primitive_headers.iter().map(|p| p.num_triangles * 3).sum();
        if num_vertices == 0 {
            return Err(SubMeshError::NoVertices(index));
        }
        if num_indices == 0 {
            return Err(SubMeshError::NoIndices(index));
        }

        let source_vertices = file.vertex_span(index);
        let source_indices = file.index_span(index);

        let bounding_box = AxisAlignedBoundingBox::from_points(
            source_vertices.iter().map(|v| v.position),
        )
        .unwrap_or_else(|| AxisAlignedBoundingBox::from_min_max(Vec3::ZERO, Vec3::ZERO));

        let mut vertices: Vec<ModelVertex> = source_vertices
            .iter()
            .map(|v| ModelVertex {
                position: v.position.to_array(),
                tex_coord: v.tex_coord.to_array(),
                normal: v.normal.to_array(),
                bone_indices: [-1, -1],
            })
            .collect();

        let mut cursor = 0usize;
        for group in file.vertex_group_span(index) {
            let end = (cursor + usize::from(group.vertex_count)).min(vertices.len());
            for vertex in &mut vertices[cursor..end] {
                vertex.bone_indices[0] = i32::from(group.bone_index);
            }
            cursor = end;
        }

        let mut indices = Vec::with_capacity(num_indices as usize);
        let mut primitives = Vec::with_capacity(primitive_headers.len());
        let mut start_vertex = 0u32;
        let mut start_index = 0u32;
        for primitive in primitive_headers {
            let count = primitive.num_triangles * 3;
            let range = start_index as usize..(start_index + count) as usize;
            indices.extend(
                source_indices[range]
                    .iter()
                    .map(|&i| u32::from(i) + start_vertex),
            );

            let material = primitive.material;
            primitives.push(Primitive::new(
                material.skin_id,
                start_index,
                count,
                material.kind,
                material.alpha_cutout_threshold,
            ));

            start_vertex += primitive.num_vertices;
            start_index += count;
        }

        let name = format!("{owner} submesh {index}");
        let mesh = if vertices.len() <= usize::from(u16::MAX) + 1 {
            let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
            Mesh::from_u16(&name, &vertices, &narrow)
        } else {
            Mesh::from_u32(&name, &vertices, &indices)
        };

        Ok(Self {
            owner: owner.to_string(),
            index,
            flags: header.flags,
            mesh,
            primitives,
            bounding_box,
        })
    }

    pub fn upload(&mut self, gpu: &Gpu) {
        self.mesh.upload(gpu);
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Index of this submesh in the source file
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn flags(&self) -> SubmeshFlags {
        self.flags
    }

    pub fn is_physics(&self) -> bool {
        self.flags.is_physics
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn bounding_box(&self) -> &AxisAlignedBoundingBox {
        &self.bounding_box
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::l3d::{L3dMaterial, L3dMeshFlags, L3dVertex, L3dVertexGroup, PrimitiveData};
    use glam::Vec2;

    fn quad(offset: f32, skin_id: u32, groups: Vec<L3dVertexGroup>) -> PrimitiveData {
        PrimitiveData {
            material: L3dMaterial {
                kind: 2,
                skin_id,
                alpha_cutout_threshold: 0,
            },
            vertices: (0..4)
                .map(|i| {
                    let p = Vec3::new(offset + (i % 2) as f32, (i / 2) as f32, -offset);
                    L3dVertex::new(p, Vec2::ZERO, Vec3::Y)
                })
                .collect(),
            indices: vec![0, 1, 2, 2, 1, 3],
            groups,
        }
    }

    fn two_primitive_file() -> L3dFile {
        let mut file = L3dFile::new("crate", L3dMeshFlags::empty());
        file.add_submesh(
            SubmeshFlags::drawable(),
            vec![
                quad(0.0, 1, vec![L3dVertexGroup { vertex_count: 4, bone_index: 3 }]),
                quad(5.0, 2, vec![
                    L3dVertexGroup { vertex_count: 1, bone_index: 0 },
                    L3dVertexGroup { vertex_count: 3, bone_index: 1 },
                ]),
            ],
        );
        file
    }

    #[test]
    fn test_index_ranges_partition() {
        let file = two_primitive_file();
        let sub_mesh = L3dSubMesh::load(&file, 0, "crate").unwrap();
        let total = sub_mesh.mesh().element_count();

        let mut expected_offset = 0;
        for primitive in sub_mesh.primitives() {
            assert_eq!(primitive.indices_offset, expected_offset);
            expected_offset += primitive.indices_count;
        }
        assert_eq!(expected_offset, total);
        assert_eq!(total, 12);
    }

    #[test]
    fn test_rebased_indices_address_same_vertex() {
        let file = two_primitive_file();
        let sub_mesh = L3dSubMesh::load(&file, 0, "crate").unwrap();
        let merged_vertices = sub_mesh.mesh().vertex_buffer().vertices::<ModelVertex>();
        let merged_indices = sub_mesh.mesh().index_buffer().unwrap().indices();

        let source_vertices = file.vertex_span(0);
        let source_indices = file.index_span(0);
        let mut vertex_start = 0usize;
        let mut index_start = 0usize;
        for header in file.primitive_span(0) {
            let count = (header.num_triangles * 3) as usize;
            for i in index_start..index_start + count {
                let original = source_vertices[vertex_start + source_indices[i] as usize];
                let merged = merged_vertices[merged_indices[i] as usize];
                assert_eq!(merged.position, original.position.to_array());
            }
            vertex_start += header.num_vertices as usize;
            index_start += count;
        }
    }

    #[test]
    fn test_bounding_box_is_tight() {
        let file = two_primitive_file();
        let sub_mesh = L3dSubMesh::load(&file, 0, "crate").unwrap();
        let aabb = sub_mesh.bounding_box();
        for v in file.vertex_span(0) {
            assert!(aabb.contains(v.position));
        }
        assert_eq!(aabb.minima, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(aabb.maxima, Vec3::new(6.0, 1.0, 0.0));
    }

    #[test]
    fn test_bone_indices_from_groups() {
        let file = two_primitive_file();
        let sub_mesh = L3dSubMesh::load(&file, 0, "crate").unwrap();
        let bones: Vec<_> = sub_mesh
            .mesh()
            .vertex_buffer()
            .vertices::<ModelVertex>()
            .iter()
            .map(|v| v.bone_indices)
            .collect();
        assert_eq!(bones[..4], [[3, -1]; 4]);
        assert_eq!(bones[4], [0, -1]);
        assert_eq!(bones[5..], [[1, -1]; 3]);
    }

    #[test]
    fn test_empty_submesh_fails() {
        let mut file = L3dFile::new("empty", L3dMeshFlags::empty());
        file.add_submesh(SubmeshFlags::drawable(), vec![]);
        file.add_submesh(
            SubmeshFlags::drawable(),
            vec![PrimitiveData {
                vertices: vec![L3dVertex::default(); 3],
                ..Default::default()
            }],
        );

        assert_eq!(L3dSubMesh::load(&file, 0, "empty").unwrap_err(), SubMeshError::NoVertices(0));
        assert_eq!(L3dSubMesh::load(&file, 1, "empty").unwrap_err(), SubMeshError::NoIndices(1));
        assert_eq!(L3dSubMesh::load(&file, 2, "empty").unwrap_err(), SubMeshError::OutOfRange(2));
    }
}
