//! Draw-call recorder
//!
//! Techniques build draw calls here the way an immediate-mode backend is
//! driven: set buffers, textures, uniforms and state, then `submit` into a
//! pass. State set before a submit is kept for the next draw when the submit
//! uses [`Discard::None`] and cleared with [`Discard::All`]. The renderer
//! replays the recorded passes on the GPU at the end of the frame.

use std::collections::BTreeMap;

use glam::{Mat4, Vec4};
use smallvec::SmallVec;

use super::buffer::{DynamicVertexBuffer, IndexBuffer, VertexBuffer};
use super::frame_buffer::FrameBuffer;
use super::shader::ShaderProgram;
use super::state::RenderState;
use super::texture::Texture2D;

/// Render passes in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderPass {
    Footprint,
    Reflection,
    Main,
}

impl RenderPass {
    pub const ALL: [Self; 3] = [Self::Footprint, Self::Reflection, Self::Main];

    pub fn name(self) -> &'static str {
        match self {
            Self::Footprint => "Footprint",
            Self::Reflection => "Reflection",
            Self::Main => "Main",
        }
    }
}

/// What a submit does with the bound state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// Keep everything bound for the next draw
    None,
    /// Reset to an empty state
    All,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexRange<'a> {
    pub buffer: &'a IndexBuffer,
    pub first: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct InstanceRange<'a> {
    pub buffer: &'a DynamicVertexBuffer,
    pub first: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TextureBinding<'a> {
    pub stage: u8,
    pub sampler: &'static str,
    pub texture: &'a Texture2D,
}

/// Everything bound for one draw
#[derive(Debug, Clone, Default)]
pub struct DrawState<'a> {
    pub transforms: Vec<Mat4>,
    pub textures: SmallVec<[TextureBinding<'a>; 4]>,
    pub uniforms: SmallVec<[(&'static str, Vec4); 4]>,
    pub vertex_buffer: Option<&'a VertexBuffer>,
    pub index: Option<IndexRange<'a>>,
    pub instances: Option<InstanceRange<'a>>,
    pub state: RenderState,
    pub rgba: u32,
}

impl<'a> DrawState<'a> {
    pub fn texture(&self, stage: u8) -> Option<&'a Texture2D> {
        self.textures
            .iter()
            .find(|binding| binding.stage == stage)
            .map(|binding| binding.texture)
    }

    pub fn uniform(&self, name: &str) -> Option<Vec4> {
        self.uniforms
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }
}

#[derive(Debug, Clone)]
pub struct Submission<'a> {
    pub program: &'a ShaderProgram,
    pub draw: DrawState<'a>,
    pub discard: Discard,
}

/// One pass worth of recorded draws
#[derive(Debug, Clone, Default)]
pub struct View<'a> {
    pub frame_buffer: Option<&'a FrameBuffer>,
    pub view: Mat4,
    pub projection: Mat4,
    pub touched: bool,
    pub wireframe: bool,
    pub submissions: Vec<Submission<'a>>,
}

/// Counters of every bind call, for checking state minimization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderStats {
    pub submits: u32,
    pub vertex_buffer_binds: u32,
    pub index_buffer_binds: u32,
    pub instance_buffer_binds: u32,
    pub state_binds: u32,
    pub transform_binds: u32,
    pub texture_binds: u32,
    pub uniform_binds: u32,
}

#[derive(Debug, Default)]
pub struct Encoder<'a> {
    pending: DrawState<'a>,
    views: BTreeMap<RenderPass, View<'a>>,
    stats: EncoderStats,
}

impl<'a> Encoder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    fn view_mut(&mut self, pass: RenderPass) -> &mut View<'a> {
        self.views.entry(pass).or_default()
    }

    /// Render `pass` into `frame_buffer`, or the back buffer when `None`
    pub fn set_view_frame_buffer(&mut self, pass: RenderPass, frame_buffer: Option<&'a FrameBuffer>) {
        self.view_mut(pass).frame_buffer = frame_buffer;
    }

    pub fn set_view_transform(&mut self, pass: RenderPass, view: Mat4, projection: Mat4) {
        let v = self.view_mut(pass);
        v.view = view;
        v.projection = projection;
    }

    pub fn set_view_wireframe(&mut self, pass: RenderPass, wireframe: bool) {
        self.view_mut(pass).wireframe = wireframe;
    }

    /// Mark the pass as used so it clears even without draws
    pub fn touch(&mut self, pass: RenderPass) {
        self.view_mut(pass).touched = true;
    }

    pub fn set_transform(&mut self, matrices: &[Mat4]) {
        self.stats.transform_binds += 1;
        self.pending.transforms.clear();
        self.pending.transforms.extend_from_slice(matrices);
    }

    pub fn set_texture(&mut self, stage: u8, sampler: &'static str, texture: &'a Texture2D) {
        self.stats.texture_binds += 1;
        self.pending.textures.retain(|binding| binding.stage != stage);
        self.pending.textures.push(TextureBinding {
            stage,
            sampler,
            texture,
        });
    }

    pub fn set_uniform(&mut self, name: &'static str, value: Vec4) {
        self.stats.uniform_binds += 1;
        if let Some(slot) = self.pending.uniforms.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.pending.uniforms.push((name, value));
        }
    }

    pub fn set_vertex_buffer(&mut self, buffer: &'a VertexBuffer) {
        self.stats.vertex_buffer_binds += 1;
        self.pending.vertex_buffer = Some(buffer);
    }

    pub fn set_index_buffer(&mut self, buffer: &'a IndexBuffer, first: u32, count: u32) {
        self.stats.index_buffer_binds += 1;
        self.pending.index = Some(IndexRange {
            buffer,
            first,
            count,
        });
    }

    pub fn set_instance_buffer(&mut self, buffer: &'a DynamicVertexBuffer, first: u32, count: u32) {
        self.stats.instance_buffer_binds += 1;
        self.pending.instances = Some(InstanceRange {
            buffer,
            first,
            count,
        });
    }

    pub fn set_state(&mut self, state: RenderState, rgba: u32) {
        self.stats.state_binds += 1;
        self.pending.state = state;
        self.pending.rgba = rgba;
    }

    /// Record a draw with the bound state into `pass`
    pub fn submit(&mut self, pass: RenderPass, program: &'a ShaderProgram, discard: Discard) {
        self.stats.submits += 1;
        let draw = match discard {
            Discard::None => self.pending.clone(),
            Discard::All => std::mem::take(&mut self.pending),
        };
        self.view_mut(pass).submissions.push(Submission {
            program,
            draw,
            discard,
        });
    }

    /// Drop any bound state without drawing
    pub fn discard(&mut self) {
        self.pending = DrawState::default();
    }

    pub fn stats(&self) -> EncoderStats {
        self.stats
    }

    pub fn view(&self, pass: RenderPass) -> Option<&View<'a>> {
        self.views.get(&pass)
    }

    /// Recorded passes in execution order
    pub fn views(&self) -> impl Iterator<Item = (RenderPass, &View<'a>)> {
        self.views.iter().map(|(pass, view)| (*pass, view))
    }

    pub fn submissions(&self, pass: RenderPass) -> &[Submission<'a>] {
        self.views
            .get(&pass)
            .map_or(&[][..], |view| view.submissions.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::shader::ShaderManager;
    use crate::graphics::vertex::LineVertex;
    use glam::Vec3;

    #[test]
    fn test_discard_all_resets_state() {
        let shaders = ShaderManager::new();
        let program = shaders.get_shader("DebugLine").unwrap();
        let buffer = VertexBuffer::new("lines", &[LineVertex::new(Vec3::ZERO, Vec4::ONE); 2]);

        let mut encoder = Encoder::new();
        encoder.set_vertex_buffer(&buffer);
        encoder.set_state(RenderState::WRITE_RGB, 0);
        encoder.submit(RenderPass::Main, program, Discard::All);
        encoder.submit(RenderPass::Main, program, Discard::All);

        let submissions = encoder.submissions(RenderPass::Main);
        assert_eq!(submissions.len(), 2);
        assert!(submissions[0].draw.vertex_buffer.is_some());
        assert!(submissions[1].draw.vertex_buffer.is_none());
        assert_eq!(submissions[1].draw.state, RenderState::empty());
    }

    #[test]
    fn test_discard_none_preserves_state() {
        let shaders = ShaderManager::new();
        let program = shaders.get_shader("DebugLine").unwrap();
        let buffer = VertexBuffer::new("lines", &[LineVertex::new(Vec3::ZERO, Vec4::ONE); 2]);

        let mut encoder = Encoder::new();
        encoder.set_vertex_buffer(&buffer);
        encoder.set_uniform("u_tint", Vec4::ONE);
        encoder.submit(RenderPass::Main, program, Discard::None);
        encoder.submit(RenderPass::Main, program, Discard::All);

        let submissions = encoder.submissions(RenderPass::Main);
        assert!(submissions[1].draw.vertex_buffer.is_some());
        assert_eq!(submissions[1].draw.uniform("u_tint"), Some(Vec4::ONE));
        assert_eq!(encoder.stats().vertex_buffer_binds, 1);
        assert_eq!(encoder.stats().submits, 2);
    }

    #[test]
    fn test_views_run_in_pass_order() {
        let mut encoder = Encoder::new();
        encoder.touch(RenderPass::Main);
        encoder.touch(RenderPass::Footprint);
        encoder.touch(RenderPass::Reflection);
        let order: Vec<_> = encoder.views().map(|(pass, _)| pass).collect();
        assert_eq!(
            order,
            vec![RenderPass::Footprint, RenderPass::Reflection, RenderPass::Main]
        );
    }

    #[test]
    fn test_set_texture_replaces_stage() {
        let a = Texture2D::solid_color("a", [255; 4]);
        let b = Texture2D::solid_color("b", [0; 4]);
        let shaders = ShaderManager::new();
        let mut encoder = Encoder::new();
        encoder.set_texture(0, "s_diffuse", &a);
        encoder.set_texture(0, "s_diffuse", &b);
        encoder.set_texture(1, "s_heightmap", &a);
        encoder.submit(RenderPass::Main, shaders.get_shader("Object").unwrap(), Discard::All);
        let draw = &encoder.submissions(RenderPass::Main)[0].draw;
        assert_eq!(draw.textures.len(), 2);
        assert_eq!(draw.texture(0).map(Texture2D::id), Some(b.id()));
    }
}
