use glam::Vec4;

use super::{DrawSceneDesc, MeshSubmitDesc, SceneServices};
use crate::graphics::shader::{samplers, uniforms};
use crate::graphics::{Encoder, RenderState};
use crate::renderer::Renderer;

pub(super) fn render<'a>(
    renderer: &Renderer,
    encoder: &mut Encoder<'a>,
    services: &SceneServices<'a>,
    desc: &DrawSceneDesc<'a>,
) {
    let Some(program) = services.program("Sky") else {
        return;
    };
    let sky = services.sky;

    encoder.set_texture(0, samplers::DIFFUSE, sky.texture());
    encoder.set_uniform(
        uniforms::TYPE_ALIGNMENT,
        Vec4::new(sky.current_sky_type(), desc.sky_alignment + 1.0, 0.0, 0.0),
    );

    let mut state = RenderState::DEFAULT_INVERTED_Z;
    if !desc.cull_back {
        state = state.with_cull(RenderState::CULL_CCW);
    }
    let mut submit = MeshSubmitDesc::new(desc.pass, program, state);
    submit.is_sky = true;

    renderer.draw_mesh(encoder, services, sky.mesh(), &submit, 0);
}
