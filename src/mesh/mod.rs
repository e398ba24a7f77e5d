//! Render-ready models built from decoded L3D and ANM data

mod anim;
mod bounding_box;
mod l3d_mesh;
mod primitive;
mod sub_mesh;

pub use anim::{AnimError, Frame, L3dAnim};
pub use bounding_box::AxisAlignedBoundingBox;
pub use l3d_mesh::{Footprint, L3dMesh, MeshError, PhysicsMesh};
pub use primitive::{BlendMode, MaterialState, MaterialType, Primitive, material_state};
pub use sub_mesh::{L3dSubMesh, SubMeshError};
