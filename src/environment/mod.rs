//! Sky, ocean and landscape the techniques draw around the entities
//!
//! Techniques only see these through the interfaces below. The default
//! implementations build their geometry procedurally.

mod island;
mod ocean;
mod sky;

pub use island::{BLOCK_SIZE, HEIGHT_MAP_SCALE, LandBlock, LandIsland};
pub use ocean::Ocean;
pub use sky::{Sky, SkyError};

use glam::{Mat4, Vec2, Vec4};

use crate::graphics::{FrameBuffer, Gpu, Mesh, Texture2D};
use crate::mesh::L3dMesh;
use crate::resources::{ResourceId, hash_name};

/// Texture resource holding the fine terrain bump map
pub const SMALL_BUMP_TEXTURE_ID: ResourceId = hash_name("raw/smallbumpa");

/// World-space rectangle on the XZ plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent2D {
    pub minimum: Vec2,
    pub maximum: Vec2,
}

pub trait SkyInterface {
    fn mesh(&self) -> &L3dMesh;
    fn texture(&self) -> &Texture2D;
    /// Blend index between the day, dusk and night skies
    fn current_sky_type(&self) -> f32;
    fn upload(&mut self, gpu: &Gpu);
}

pub trait OceanInterface {
    fn mesh(&self) -> &Mesh;
    fn diffuse_texture(&self) -> ResourceId;
    fn alpha_texture(&self) -> ResourceId;
    fn reflection_frame_buffer(&self) -> &FrameBuffer;
    /// Water plane as `(normal, distance)`
    fn reflection_plane(&self) -> Vec4;
    fn upload(&mut self, gpu: &Gpu);
}

pub trait LandIslandInterface {
    fn height_at(&self, position: Vec2) -> f32;
    fn blocks(&self) -> &[LandBlock];
    fn albedo_array(&self) -> &Texture2D;
    fn bump(&self) -> &Texture2D;
    fn height_map(&self) -> &Texture2D;
    fn footprint_frame_buffer(&self) -> &FrameBuffer;
    /// Top-down view used to render footprints
    fn ortho_view(&self) -> Mat4;
    fn ortho_proj(&self) -> Mat4;
    fn extent(&self) -> Extent2D;
    fn upload(&mut self, gpu: &Gpu);
}
