//! Shader programs and the program registry
//!
//! All programs live in one WGSL module; a program names its entry points,
//! the vertex format it reads, and the uniforms and samplers it declares.

use rustc_hash::FxHashMap;

use super::vertex::{FootprintVertex, LineVertex, ModelVertex, Vertex, VertexLayout, VertexType};

/// Uniform names shared by techniques and programs
pub mod uniforms {
    pub const SKY_ALPHA_THRESHOLD: &str = "u_skyAlphaThreshold";
    pub const ISLAND_EXTENT: &str = "u_islandExtent";
    pub const TYPE_ALIGNMENT: &str = "u_typeAlignment";
    pub const SKY: &str = "u_sky";
    pub const BLOCK_POSITION_AND_SIZE: &str = "u_blockPositionAndSize";
    pub const SKY_AND_BUMP: &str = "u_skyAndBump";
    pub const SAMPLE_RECT: &str = "u_sampleRect";
    pub const TINT: &str = "u_tint";
}

/// Sampler names shared by techniques and programs
pub mod samplers {
    pub const DIFFUSE: &str = "s_diffuse";
    pub const HEIGHTMAP: &str = "s_heightmap";
    pub const ALPHA: &str = "s_alpha";
    pub const REFLECTION: &str = "s_reflection";
    pub const MATERIALS: &str = "s0_materials";
    pub const BUMP: &str = "s1_bump";
    pub const SMALL_BUMP: &str = "s2_smallBump";
    pub const FOOTPRINTS: &str = "s3_footprints";
}

/// Maximum uniform vectors a program may declare
pub const MAX_UNIFORMS: usize = 4;
/// Maximum texture stages
pub const MAX_TEXTURE_STAGES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    name: &'static str,
    vertex_entry: &'static str,
    fragment_entry: &'static str,
    layout: VertexLayout,
    instanced: bool,
    uniforms: &'static [&'static str],
    samplers: &'static [&'static str],
}

impl ShaderProgram {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn vertex_entry(&self) -> &'static str {
        self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &'static str {
        self.fragment_entry
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Whether the program reads per-instance matrices
    pub fn is_instanced(&self) -> bool {
        self.instanced
    }

    /// Slot of a declared uniform
    pub fn uniform_slot(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|u| *u == name)
    }

    /// Texture stage a declared sampler is bound on
    pub fn sampler_stage(&self, name: &str) -> Option<usize> {
        self.samplers.iter().position(|s| *s == name)
    }
}

macro_rules! program {
    ($name:literal, $vertex:ty, $instanced:expr, [$($uniform:expr),*], [$($sampler:expr),*]) => {
        ShaderProgram {
            name: $name,
            vertex_entry: concat!("vs_", $name),
            fragment_entry: concat!("fs_", $name),
            layout: <$vertex as VertexType>::LAYOUT,
            instanced: $instanced,
            uniforms: &[$($uniform),*],
            samplers: &[$($sampler),*],
        }
    };
}

fn builtin_programs() -> Vec<ShaderProgram> {
    use self::samplers as s;
    use self::uniforms as u;

    vec![
        program!("Object", ModelVertex, false,
            [u::SKY_ALPHA_THRESHOLD, u::ISLAND_EXTENT], [s::DIFFUSE, s::HEIGHTMAP]),
        program!("ObjectInstanced", ModelVertex, true,
            [u::SKY_ALPHA_THRESHOLD, u::ISLAND_EXTENT], [s::DIFFUSE, s::HEIGHTMAP]),
        program!("ObjectHeightMapInstanced", ModelVertex, true,
            [u::SKY_ALPHA_THRESHOLD, u::ISLAND_EXTENT], [s::DIFFUSE, s::HEIGHTMAP]),
        program!("Sky", ModelVertex, false, [u::TYPE_ALIGNMENT], [s::DIFFUSE]),
        program!("Water", Vertex, false, [u::SKY], [s::DIFFUSE, s::ALPHA, s::REFLECTION]),
        program!("Terrain", Vertex, false,
            [u::BLOCK_POSITION_AND_SIZE, u::ISLAND_EXTENT, u::SKY_AND_BUMP],
            [s::MATERIALS, s::BUMP, s::SMALL_BUMP, s::FOOTPRINTS]),
        program!("DebugLine", LineVertex, false, [], []),
        program!("DebugLineInstanced", LineVertex, true, [], []),
        program!("Sprite", Vertex, false, [u::SAMPLE_RECT, u::TINT], [s::DIFFUSE]),
        program!("FootprintInstanced", FootprintVertex, true, [], [s::DIFFUSE]),
    ]
}

/// Registry of every shader program, by name
#[derive(Debug)]
pub struct ShaderManager {
    programs: FxHashMap<&'static str, ShaderProgram>,
}

impl ShaderManager {
    /// Load the built-in programs
    pub fn new() -> Self {
        let programs: FxHashMap<_, _> = builtin_programs()
            .into_iter()
            .map(|program| (program.name, program))
            .collect();
        log::debug!("Loaded {} shader programs", programs.len());
        Self { programs }
    }

    pub fn get_shader(&self, name: &str) -> Option<&ShaderProgram> {
        self.programs.get(name)
    }

    pub fn programs(&self) -> impl Iterator<Item = &ShaderProgram> {
        self.programs.values()
    }
}

impl Default for ShaderManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_programs_fit_limits() {
        let manager = ShaderManager::new();
        assert_eq!(manager.programs().count(), 10);
        for program in manager.programs() {
            assert!(program.uniforms.len() <= MAX_UNIFORMS, "{}", program.name());
            assert!(program.samplers.len() <= MAX_TEXTURE_STAGES, "{}", program.name());
        }
    }

    #[test]
    fn test_lookup_and_slots() {
        let manager = ShaderManager::new();
        let object = manager.get_shader("ObjectInstanced").unwrap();
        assert!(object.is_instanced());
        assert_eq!(object.vertex_entry(), "vs_ObjectInstanced");
        assert_eq!(object.uniform_slot(uniforms::ISLAND_EXTENT), Some(1));
        assert_eq!(object.sampler_stage(samplers::HEIGHTMAP), Some(1));
        assert!(manager.get_shader("Missing").is_none());
    }
}
