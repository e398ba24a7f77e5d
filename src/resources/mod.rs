//! Loaded meshes, textures and animations, addressed by hashed name

mod handle;
mod manager;

pub use handle::{ResourceHandle, ResourceId, hash_name};
pub use manager::ResourceManager;

use crate::graphics::{Gpu, Texture2D};
use crate::mesh::{L3dAnim, L3dMesh};

#[derive(Default)]
pub struct Resources {
    pub meshes: ResourceManager<L3dMesh>,
    pub textures: ResourceManager<Texture2D>,
    pub animations: ResourceManager<L3dAnim>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create GPU objects for every mesh and texture
    pub fn upload(&mut self, gpu: &Gpu) {
        for mesh in self.meshes.values_mut() {
            mesh.upload(gpu);
        }
        for texture in self.textures.values_mut() {
            if !texture.is_uploaded() {
                texture.upload(gpu);
            }
        }
        log::info!(
            "Uploaded {} meshes and {} textures",
            self.meshes.len(),
            self.textures.len()
        );
    }
}
