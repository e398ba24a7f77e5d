//! Rendering module
//!
//! Multi-pass scene drawing: techniques record draws into an encoder and the
//! renderer replays them with wgpu once per frame.

mod camera;
mod context;
mod executor;
mod screenshot;
mod techniques;

pub use camera::Camera;
pub use context::{ALL_SUB_MESHES, Renderer, RendererError};
pub use techniques::{BuiltinMeshes, DrawSceneDesc, MeshSubmitDesc, SceneServices, Technique};
