//! Entity Component System module
//!
//! Built on top of the hecs ECS library

pub mod components;
mod rendering_system;
mod world;

pub use components::{
    DebugCross, Footpath, FootpathNode, MorphWithTerrain, Sprite, Stream, StreamNode, TempleInteriorPart,
    TempleRoom, Transform,
};
pub use rendering_system::{
    CommonInstances, InstancePolicy, InstanceSource, InstancedDrawDesc, PrepareScene,
    RenderContext, RenderingSystem, RenderingSystemCommon, RenderingSystemInterface,
    RenderingSystemTemple, TempleInstances, instance_matrix,
};
pub use world::World;
