//! Decoded L3D model container
//!
//! Holds the structures a model file decodes into: flat arrays of primitive
//! headers, vertices, indices and vertex groups, plus per-submesh spans into
//! them. The mesh builders only read through these spans.

use std::ops::Range;

use glam::{Mat4, Vec2, Vec3};

use super::flags::{L3dMeshFlags, SubmeshFlags};

/// Skin id meaning "no texture"
pub const NO_SKIN: u32 = u32::MAX;

/// Bone parent value of a root bone
pub const NO_BONE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct L3dVertex {
    pub position: Vec3,
    pub tex_coord: Vec2,
    pub normal: Vec3,
}

impl L3dVertex {
    pub fn new(position: Vec3, tex_coord: Vec2, normal: Vec3) -> Self {
        Self {
            position,
            tex_coord,
            normal,
        }
    }
}

/// Run of consecutive vertices skinned to one bone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L3dVertexGroup {
    pub vertex_count: u16,
    pub bone_index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L3dMaterial {
    /// Index into the material render-state table
    pub kind: u32,
    pub skin_id: u32,
    pub alpha_cutout_threshold: u8,
}

impl Default for L3dMaterial {
    fn default() -> Self {
        Self {
            kind: 0,
            skin_id: NO_SKIN,
            alpha_cutout_threshold: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct L3dPrimitiveHeader {
    pub material: L3dMaterial,
    pub num_vertices: u32,
    pub num_triangles: u32,
    pub num_groups: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct L3dSubmeshHeader {
    pub flags: SubmeshFlags,
    pub num_primitives: u32,
    pub num_bones: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L3dBone {
    pub parent: u32,
    pub first_child: u32,
    pub right_sibling: u32,
    /// Row-major 3x3 orientation (x axis, y axis, z axis)
    pub orientation: [f32; 9],
    pub position: Vec3,
}

impl L3dBone {
    /// Local bone matrix built from orientation axes and position
    pub fn matrix(&self) -> Mat4 {
        let o = &self.orientation;
        Mat4::from_cols(
            glam::Vec4::new(o[0], o[1], o[2], 0.0),
            glam::Vec4::new(o[3], o[4], o[5], 0.0),
            glam::Vec4::new(o[6], o[7], o[8], 0.0),
            self.position.extend(1.0),
        )
    }
}

/// 256x256 skin texture stored as packed 4-bit channels
#[derive(Debug, Clone, PartialEq)]
pub struct L3dTexture {
    pub id: u32,
    /// `B:4 G:4 R:4 A:4` from the low nibble up
    pub texels: Vec<u16>,
}

impl L3dTexture {
    pub const WIDTH: u32 = 256;
    pub const HEIGHT: u32 = 256;

    /// Skin filled with a single packed texel
    pub fn solid(id: u32, texel: u16) -> Self {
        Self {
            id,
            texels: vec![texel; (Self::WIDTH * Self::HEIGHT) as usize],
        }
    }

    /// Expand to 8-bit RGBA
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.texels.len() * 4);
        for &texel in &self.texels {
            let b = (texel & 0xF) as u8;
            let g = ((texel >> 4) & 0xF) as u8;
            let r = ((texel >> 8) & 0xF) as u8;
            let a = ((texel >> 12) & 0xF) as u8;
            rgba.extend([r * 17, g * 17, b * 17, a * 17]);
        }
        rgba
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct L3dFootprintVertex {
    pub position: Vec3,
    pub tex_coord: Vec2,
}

/// Landscape decal drawn under a building
#[derive(Debug, Clone, PartialEq)]
pub struct L3dFootprint {
    pub texture: L3dTexture,
    pub vertices: Vec<L3dFootprintVertex>,
}

/// One primitive's worth of data handed to [`L3dFile::add_submesh`]
#[derive(Debug, Clone, Default)]
pub struct PrimitiveData {
    pub material: L3dMaterial,
    pub vertices: Vec<L3dVertex>,
    /// Triangle list indices local to `vertices`
    pub indices: Vec<u16>,
    pub groups: Vec<L3dVertexGroup>,
}

/// A decoded model file
#[derive(Debug, Clone, Default)]
pub struct L3dFile {
    flags: L3dMeshFlags,
    submesh_headers: Vec<L3dSubmeshHeader>,
    primitive_headers: Vec<L3dPrimitiveHeader>,
    vertices: Vec<L3dVertex>,
    indices: Vec<u16>,
    vertex_groups: Vec<L3dVertexGroup>,
    primitive_spans: Vec<Range<usize>>,
    vertex_spans: Vec<Range<usize>>,
    index_spans: Vec<Range<usize>>,
    vertex_group_spans: Vec<Range<usize>>,
    skins: Vec<L3dTexture>,
    bones: Option<Vec<L3dBone>>,
    door_position: Option<Vec3>,
    footprints: Option<Vec<L3dFootprint>>,
    extra_metrics: Option<Vec<Mat4>>,
    name: String,
}

impl L3dFile {
    pub fn new(name: impl Into<String>, flags: L3dMeshFlags) -> Self {
        Self {
            name: name.into(),
            flags,
            ..Default::default()
        }
    }

    /// Append a submesh and return its index
    pub fn add_submesh(&mut self, flags: SubmeshFlags, primitives: Vec<PrimitiveData>) -> usize {
        let primitive_start = self.primitive_headers.len();
        let vertex_start = self.vertices.len();
        let index_start = self.indices.len();
        let group_start = self.vertex_groups.len();

        let num_primitives = primitives.len() as u32;
        for primitive in primitives {
            self.primitive_headers.push(L3dPrimitiveHeader {
                material: primitive.material,
                num_vertices: primitive.vertices.len() as u32,
                num_triangles: (primitive.indices.len() / 3) as u32,
                num_groups: primitive.groups.len() as u32,
            });
            self.vertices.extend(primitive.vertices);
            self.indices.extend(primitive.indices);
            self.vertex_groups.extend(primitive.groups);
        }

        self.submesh_headers.push(L3dSubmeshHeader {
            flags,
            num_primitives,
            num_bones: 0,
        });
        self.primitive_spans
            .push(primitive_start..self.primitive_headers.len());
        self.vertex_spans.push(vertex_start..self.vertices.len());
        self.index_spans.push(index_start..self.indices.len());
        self.vertex_group_spans
            .push(group_start..self.vertex_groups.len());

        self.submesh_headers.len() - 1
    }

    pub fn add_skin(&mut self, skin: L3dTexture) {
        self.skins.push(skin);
    }

    pub fn set_bones(&mut self, bones: Vec<L3dBone>) {
        self.bones = Some(bones);
    }

    pub fn set_door_position(&mut self, position: Vec3) {
        self.door_position = Some(position);
    }

    pub fn set_footprints(&mut self, footprints: Vec<L3dFootprint>) {
        self.footprints = Some(footprints);
    }

    pub fn set_extra_metrics(&mut self, metrics: Vec<Mat4>) {
        self.extra_metrics = Some(metrics);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> L3dMeshFlags {
        self.flags
    }

    pub fn submesh_headers(&self) -> &[L3dSubmeshHeader] {
        &self.submesh_headers
    }

    pub fn primitive_span(&self, submesh: usize) -> &[L3dPrimitiveHeader] {
        &self.primitive_headers[self.primitive_spans[submesh].clone()]
    }

    pub fn vertex_span(&self, submesh: usize) -> &[L3dVertex] {
        &self.vertices[self.vertex_spans[submesh].clone()]
    }

    pub fn index_span(&self, submesh: usize) -> &[u16] {
        &self.indices[self.index_spans[submesh].clone()]
    }

    pub fn vertex_group_span(&self, submesh: usize) -> &[L3dVertexGroup] {
        &self.vertex_groups[self.vertex_group_spans[submesh].clone()]
    }

    pub fn skins(&self) -> &[L3dTexture] {
        &self.skins
    }

    pub fn bones(&self) -> Option<&[L3dBone]> {
        self.bones.as_deref()
    }

    pub fn door_position(&self) -> Option<Vec3> {
        self.door_position
    }

    pub fn footprints(&self) -> Option<&[L3dFootprint]> {
        self.footprints.as_deref()
    }

    pub fn extra_metrics(&self) -> Option<&[Mat4]> {
        self.extra_metrics.as_deref()
    }
}
