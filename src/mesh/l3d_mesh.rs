//! A complete model: submeshes, skins, bones and optional sections

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use rapier3d::prelude::{Point, SharedShape};

use crate::graphics::{FootprintVertex, Gpu, Mesh, Texture2D, TextureError, Topology, VertexBuffer};
use crate::l3d::{L3dFile, L3dMeshFlags, L3dTexture, NO_BONE};

use super::bounding_box::AxisAlignedBoundingBox;
use super::sub_mesh::L3dSubMesh;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("{mesh}: flagged {section} section is missing")]
    MissingSection { mesh: String, section: &'static str },
    #[error("{mesh}: skin {skin_id}: {source}")]
    Skin {
        mesh: String,
        skin_id: u32,
        source: TextureError,
    },
}

/// Convex collision hull built from the physics submeshes
#[derive(Clone)]
pub struct PhysicsMesh {
    pub shape: SharedShape,
    pub mass: f32,
}

impl std::fmt::Debug for PhysicsMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsMesh").field("mass", &self.mass).finish_non_exhaustive()
    }
}

/// Decal drawn into the island footprint map
#[derive(Debug)]
pub struct Footprint {
    pub texture: Texture2D,
    pub mesh: Mesh,
}

#[derive(Debug)]
pub struct L3dMesh {
    name: String,
    flags: L3dMeshFlags,
    sub_meshes: Vec<L3dSubMesh>,
    skins: BTreeMap<u32, Texture2D>,
    footprints: Vec<Footprint>,
    bone_parents: Vec<u32>,
    bone_matrices: Vec<Mat4>,
    door_position: Option<Vec3>,
    extra_metrics: Vec<Mat4>,
    physics_mesh: Option<PhysicsMesh>,
    bounding_box: AxisAlignedBoundingBox,
}

fn skin_texture(mesh: &str, skin: &L3dTexture) -> Result<Texture2D, MeshError> {
    Texture2D::from_rgba(
        format!("{mesh} skin {}", skin.id),
        L3dTexture::WIDTH,
        L3dTexture::HEIGHT,
        skin.to_rgba8(),
    )
    .map_err(|source| MeshError::Skin {
        mesh: mesh.to_string(),
        skin_id: skin.id,
        source,
    })
}

fn section<T>(file: &L3dFile, flag: L3dMeshFlags, value: Option<T>, section: &'static str) -> Result<Option<T>, MeshError> {
    match value {
        Some(value) if file.flags().contains(flag) => Ok(Some(value)),
        None if file.flags().contains(flag) => Err(MeshError::MissingSection {
            mesh: file.name().to_string(),
            section,
        }),
        _ => Ok(None),
    }
}

impl L3dMesh {
    pub fn load(file: &L3dFile) -> Result<Self, MeshError> {
        let name = file.name().to_string();
        log::debug!("Loading L3D mesh {name}");

        let mut sub_meshes = Vec::with_capacity(file.submesh_headers().len());
        for index in 0..file.submesh_headers().len() {
            match L3dSubMesh::load(file, index, &name) {
                Ok(sub_mesh) => sub_meshes.push(sub_mesh),
                Err(err) => log::warn!("{name}: skipping submesh: {err}"),
            }
        }

        let mut skins = BTreeMap::new();
        for skin in file.skins() {
            skins.insert(skin.id, skin_texture(&name, skin)?);
        }

        let mut footprints = Vec::new();
        let landscape = section(
            file,
            L3dMeshFlags::CONTAINS_LANDSCAPE_FEATURE,
            file.footprints(),
            "footprint",
        )?;
        for (i, footprint) in landscape.unwrap_or_default().iter().enumerate() {
            let vertices: Vec<FootprintVertex> = footprint
                .vertices
                .iter()
                .map(|v| FootprintVertex {
                    position: v.position.to_array(),
                    tex_coord: v.tex_coord.to_array(),
                })
                .collect();
            let mesh_name = format!("{name} footprint {i}");
            footprints.push(Footprint {
                texture: skin_texture(&name, &footprint.texture)?,
                mesh: Mesh::new(VertexBuffer::new(&mesh_name, &vertices), None, Topology::Triangles),
            });
        }

        let mut bone_parents = Vec::new();
        let mut bone_matrices: Vec<Mat4> = Vec::new();
        if let Some(bones) = section(file, L3dMeshFlags::HAS_BONES, file.bones(), "bone")? {
            for (i, bone) in bones.iter().enumerate() {
                let local = bone.matrix();
                let parent = bone.parent;
                let matrix = if parent == NO_BONE {
                    local
                } else if (parent as usize) < i {
                    bone_matrices[parent as usize] * local
                } else {
                    log::warn!("{name}: bone {i} has parent {parent} out of order");
                    local
                };
                bone_parents.push(parent);
                bone_matrices.push(matrix);
            }
        }

        let door_position = section(
            file,
            L3dMeshFlags::HAS_DOOR_POSITION,
            file.door_position(),
            "door position",
        )?;
        let extra_metrics = section(
            file,
            L3dMeshFlags::CONTAINS_EXTRA_METRICS,
            file.extra_metrics(),
            "extra metrics",
        )?
        .map(<[Mat4]>::to_vec)
        .unwrap_or_default();

        let physics_mesh = Self::build_physics_mesh(&name, file, &sub_meshes);
        let bounding_box = match &physics_mesh {
            Some(physics) => {
                let aabb = physics.shape.compute_local_aabb();
                AxisAlignedBoundingBox::from_min_max(
                    Vec3::new(aabb.mins.x, aabb.mins.y, aabb.mins.z),
                    Vec3::new(aabb.maxs.x, aabb.maxs.y, aabb.maxs.z),
                )
            }
            None => {
                let mut aabb = AxisAlignedBoundingBox::new();
                for sub_mesh in &sub_meshes {
                    aabb.merge(sub_mesh.bounding_box());
                }
                aabb
            }
        };

        log::debug!(
            "Loaded {name}: {} submeshes, {} skins, {} bones",
            sub_meshes.len(),
            skins.len(),
            bone_matrices.len()
        );

        Ok(Self {
            name,
            flags: file.flags(),
            sub_meshes,
            skins,
            footprints,
            bone_parents,
            bone_matrices,
            door_position,
            extra_metrics,
            physics_mesh,
            bounding_box,
        })
    }

    fn build_physics_mesh(name: &str, file: &L3dFile, sub_meshes: &[L3dSubMesh]) -> Option<PhysicsMesh> {
        let points: Vec<Point<f32>> = sub_meshes
            .iter()
            .filter(|sub_mesh| sub_mesh.is_physics())
            .flat_map(|sub_mesh| file.vertex_span(sub_mesh.index()))
            .map(|v| Point::new(v.position.x, v.position.y, v.position.z))
            .collect();
        if points.is_empty() {
            return None;
        }

        match SharedShape::convex_hull(&points) {
            Some(shape) => {
                let mass = shape.mass_properties(1.0).mass();
                Some(PhysicsMesh { shape, mass })
            }
            None => {
                log::warn!("{name}: physics submeshes do not form a convex hull");
                None
            }
        }
    }

    /// Create GPU objects for every submesh, skin and footprint
    pub fn upload(&mut self, gpu: &Gpu) {
        for sub_mesh in &mut self.sub_meshes {
            sub_mesh.upload(gpu);
        }
        for skin in self.skins.values_mut() {
            skin.upload(gpu);
        }
        for footprint in &mut self.footprints {
            footprint.texture.upload(gpu);
            footprint.mesh.upload(gpu);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> L3dMeshFlags {
        self.flags
    }

    pub fn is_boned(&self) -> bool {
        self.flags.contains(L3dMeshFlags::HAS_BONES)
    }

    pub fn is_no_draw(&self) -> bool {
        self.flags.contains(L3dMeshFlags::NO_DRAW)
    }

    pub fn contains_landscape_feature(&self) -> bool {
        self.flags.contains(L3dMeshFlags::CONTAINS_LANDSCAPE_FEATURE)
    }

    pub fn sub_meshes(&self) -> &[L3dSubMesh] {
        &self.sub_meshes
    }

    pub fn num_sub_meshes(&self) -> usize {
        self.sub_meshes.len()
    }

    pub fn skins(&self) -> &BTreeMap<u32, Texture2D> {
        &self.skins
    }

    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    pub fn bone_parents(&self) -> &[u32] {
        &self.bone_parents
    }

    /// Default pose, each matrix already composed with its parents
    pub fn bone_matrices(&self) -> &[Mat4] {
        &self.bone_matrices
    }

    pub fn door_position(&self) -> Option<Vec3> {
        self.door_position
    }

    pub fn extra_metrics(&self) -> &[Mat4] {
        &self.extra_metrics
    }

    pub fn has_physics_mesh(&self) -> bool {
        self.physics_mesh.is_some()
    }

    pub fn physics_mesh(&self) -> Option<&PhysicsMesh> {
        self.physics_mesh.as_ref()
    }

    pub fn bounding_box(&self) -> &AxisAlignedBoundingBox {
        &self.bounding_box
    }
}
