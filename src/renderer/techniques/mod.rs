//! Rendering techniques
//!
//! Each technique binds and submits its own draws for one pass. A pass runs
//! the techniques it was asked for in the order of [`TECHNIQUES`], whatever
//! order the caller listed them in.

mod debug_cross;
mod entities;
mod footprint;
mod island;
mod sky;
mod sprites;
mod test_model;
mod water;

use std::borrow::Cow;

use bitflags::bitflags;
use glam::Mat4;
use serde::{Deserialize, Serialize};

use super::Camera;
use super::context::Renderer;
use crate::ecs::{RenderContext, World};
use crate::environment::{LandIslandInterface, OceanInterface, SkyInterface};
use crate::graphics::{
    Encoder, FrameBuffer, InstanceRange, Mesh, RenderPass, RenderState, ShaderManager, ShaderProgram,
    debug_lines,
};
use crate::resources::Resources;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Technique: u16 {
        const SKY = 1 << 0;
        const WATER = 1 << 1;
        const ISLAND = 1 << 2;
        const ENTITIES = 1 << 3;
        const SPRITES = 1 << 4;
        const TEST_MODEL = 1 << 5;
        const DEBUG_CROSS = 1 << 6;
        const FOOTPRINT = 1 << 7;
    }
}

impl Technique {
    pub fn name(self) -> &'static str {
        TECHNIQUES
            .iter()
            .find(|(technique, _, _)| *technique == self)
            .map_or("Unknown", |(_, name, _)| name)
    }
}

pub(crate) type TechniqueFn =
    for<'a> fn(&Renderer, &mut Encoder<'a>, &SceneServices<'a>, &DrawSceneDesc<'a>);

/// Registration order is execution order
pub(crate) const TECHNIQUES: [(Technique, &str, TechniqueFn); 8] = [
    (Technique::SKY, "Sky", sky::render),
    (Technique::WATER, "Water", water::render),
    (Technique::ISLAND, "Island", island::render),
    (Technique::ENTITIES, "Entities", entities::render),
    (Technique::SPRITES, "Sprites", sprites::render),
    (Technique::TEST_MODEL, "TestModel", test_model::render),
    (Technique::DEBUG_CROSS, "DebugCross", debug_cross::render),
    (Technique::FOOTPRINT, "Footprint", footprint::render),
];

/// Meshes the renderer draws on its own behalf
#[derive(Debug)]
pub struct BuiltinMeshes {
    pub plane: Mesh,
    pub cross: Mesh,
}

impl BuiltinMeshes {
    pub fn new() -> Self {
        Self {
            plane: Mesh::plane("sprite plane"),
            cross: debug_lines::create_cross(),
        }
    }

    pub fn upload(&mut self, gpu: &crate::graphics::Gpu) {
        self.plane.upload(gpu);
        self.cross.upload(gpu);
    }
}

impl Default for BuiltinMeshes {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared services the techniques draw from
#[derive(Clone, Copy)]
pub struct SceneServices<'a> {
    pub resources: &'a Resources,
    pub shaders: &'a ShaderManager,
    pub render_context: &'a RenderContext,
    pub world: &'a World,
    pub sky: &'a dyn SkyInterface,
    pub ocean: &'a dyn OceanInterface,
    pub island: &'a dyn LandIslandInterface,
    pub builtin: &'a BuiltinMeshes,
}

impl<'a> SceneServices<'a> {
    /// Look up a program, logging a miss
    pub fn program(&self, name: &str) -> Option<&'a ShaderProgram> {
        let program = self.shaders.get_shader(name);
        if program.is_none() {
            log::error!("Shader program {name} not found");
        }
        program
    }
}

/// What one pass draws and from where
#[derive(Debug, Clone)]
pub struct DrawSceneDesc<'a> {
    pub camera: Camera,
    /// Target of the pass, the back buffer when `None`
    pub frame_buffer: Option<&'a FrameBuffer>,
    pub pass: RenderPass,
    /// Milliseconds, drives animations
    pub time: u32,
    pub bump_map_strength: f32,
    pub small_bump_map_strength: f32,
    pub sky_alignment: f32,
    pub techniques: Technique,
    pub draw_bounding_boxes: bool,
    pub cull_back: bool,
    pub wireframe: bool,
}

impl<'a> DrawSceneDesc<'a> {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            frame_buffer: None,
            pass: RenderPass::Main,
            time: 0,
            bump_map_strength: 1.0,
            small_bump_map_strength: 1.0,
            sky_alignment: 0.0,
            techniques: Technique::all(),
            draw_bounding_boxes: false,
            cull_back: false,
            wireframe: false,
        }
    }
}

/// How to submit one model
#[derive(Debug, Clone)]
pub struct MeshSubmitDesc<'a> {
    pub pass: RenderPass,
    pub program: &'a ShaderProgram,
    pub state: RenderState,
    pub rgba: u32,
    /// Model matrix, or one matrix per bone
    pub model_matrices: Cow<'a, [Mat4]>,
    pub instances: Option<InstanceRange<'a>>,
    pub is_sky: bool,
    /// Also draw physics, status and low-detail submeshes
    pub draw_all: bool,
    pub morph_with_terrain: bool,
}

impl<'a> MeshSubmitDesc<'a> {
    pub fn new(pass: RenderPass, program: &'a ShaderProgram, state: RenderState) -> Self {
        Self {
            pass,
            program,
            state,
            rgba: 0,
            model_matrices: Cow::Borrowed(IDENTITY),
            instances: None,
            is_sky: false,
            draw_all: false,
            morph_with_terrain: false,
        }
    }
}

pub(crate) const IDENTITY: &[Mat4] = &[Mat4::IDENTITY];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_technique_once() {
        let mut seen = Technique::empty();
        for (technique, _, _) in TECHNIQUES {
            assert!(!seen.intersects(technique));
            seen |= technique;
        }
        assert_eq!(seen, Technique::all());
    }

    #[test]
    fn test_technique_names() {
        assert_eq!(Technique::TEST_MODEL.name(), "TestModel");
        assert_eq!((Technique::SKY | Technique::WATER).name(), "Unknown");
    }
}
