//! Render core for a 1990s-era god game
//!
//! This crate provides:
//! - L3D model and ANM animation loading into GPU meshes
//! - A recorded draw encoder replayed with wgpu
//! - Instanced entity drawing fed by a hecs world
//! - Footprint, reflection and main passes over sky, water and island

pub mod core;
pub mod ecs;
pub mod environment;
pub mod graphics;
pub mod l3d;
pub mod mesh;
pub mod renderer;
pub mod resources;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;
pub use wgpu;
pub use winit;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{Engine, EngineConfig, EngineContext, FrameStats, Game, RenderSettings};
    pub use crate::ecs::components::Mesh as MeshComponent;
    pub use crate::ecs::{DebugCross, MorphWithTerrain, Sprite, Transform, World};
    pub use crate::environment::LandIsland;
    pub use crate::l3d::{AnmFile, L3dFile};
    pub use crate::mesh::{L3dAnim, L3dMesh};
    pub use crate::renderer::{Camera, DrawSceneDesc, Renderer, Technique};
    pub use crate::resources::{ResourceId, hash_name};
    pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
    pub use winit::keyboard::KeyCode;
}
