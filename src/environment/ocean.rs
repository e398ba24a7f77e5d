use glam::Vec4;

use super::OceanInterface;
use crate::graphics::{FrameBuffer, Gpu, Mesh};
use crate::resources::{ResourceId, hash_name};

const OCEAN_SIZE: f32 = 20_000.0;
const OCEAN_CELLS: u32 = 16;
const REFLECTION_SIZE: u32 = 1024;

/// Flat sea at height zero
#[derive(Debug)]
pub struct Ocean {
    mesh: Mesh,
    reflection: FrameBuffer,
    diffuse: ResourceId,
    alpha: ResourceId,
}

impl Ocean {
    pub fn new() -> Self {
        Self::with_reflection_size(REFLECTION_SIZE)
    }

    pub fn with_reflection_size(size: u32) -> Self {
        Self {
            mesh: Mesh::grid("ocean", OCEAN_SIZE, OCEAN_CELLS),
            reflection: FrameBuffer::new("reflection", size, size, true),
            diffuse: hash_name("raw/sea"),
            alpha: hash_name("raw/seaalpha"),
        }
    }
}

impl Default for Ocean {
    fn default() -> Self {
        Self::new()
    }
}

impl OceanInterface for Ocean {
    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn diffuse_texture(&self) -> ResourceId {
        self.diffuse
    }

    fn alpha_texture(&self) -> ResourceId {
        self.alpha
    }

    fn reflection_frame_buffer(&self) -> &FrameBuffer {
        &self.reflection
    }

    fn reflection_plane(&self) -> Vec4 {
        Vec4::new(0.0, 1.0, 0.0, 0.0)
    }

    fn upload(&mut self, gpu: &Gpu) {
        self.mesh.upload(gpu);
        self.reflection.upload(gpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocean_textures() {
        let ocean = Ocean::with_reflection_size(64);
        assert_eq!(ocean.diffuse_texture(), hash_name("raw/sea"));
        assert_ne!(ocean.diffuse_texture(), ocean.alpha_texture());
        assert_eq!(ocean.reflection_frame_buffer().size(), (64, 64));
        assert!(ocean.reflection_frame_buffer().has_depth());
    }
}
