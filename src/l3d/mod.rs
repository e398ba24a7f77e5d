//! Decoded model and animation containers
//!
//! The byte-level readers live elsewhere; these are the in-memory shapes
//! they produce and that the mesh builders consume.

mod anm;
mod file;
mod flags;

pub use anm::{AnmBone, AnmFile, AnmHeader, AnmKeyframe};
pub use file::{
    L3dBone, L3dFile, L3dFootprint, L3dFootprintVertex, L3dMaterial, L3dPrimitiveHeader,
    L3dSubmeshHeader, L3dTexture, L3dVertex, L3dVertexGroup, NO_BONE, NO_SKIN, PrimitiveData,
};
pub use flags::{L3dMeshFlags, SubmeshFlags};
