use glam::Vec4;

use super::{DrawSceneDesc, SceneServices};
use crate::graphics::shader::{samplers, uniforms};
use crate::graphics::{Discard, Encoder, RenderState};
use crate::renderer::Renderer;

pub(super) fn render<'a>(
    _renderer: &Renderer,
    encoder: &mut Encoder<'a>,
    services: &SceneServices<'a>,
    desc: &DrawSceneDesc<'a>,
) {
    let Some(program) = services.program("Water") else {
        return;
    };
    let ocean = services.ocean;
    let textures = &services.resources.textures;
    let (Some(diffuse), Some(alpha)) = (
        textures.get(ocean.diffuse_texture()),
        textures.get(ocean.alpha_texture()),
    ) else {
        log::error!("Ocean textures are not loaded");
        return;
    };

    let mesh = ocean.mesh();
    if let Some(indices) = mesh.index_buffer() {
        encoder.set_index_buffer(indices, 0, indices.count());
    }
    encoder.set_vertex_buffer(mesh.vertex_buffer());
    encoder.set_state(RenderState::DEFAULT_INVERTED_Z, 0);
    encoder.set_texture(0, samplers::DIFFUSE, diffuse);
    encoder.set_texture(1, samplers::ALPHA, alpha);
    encoder.set_texture(2, samplers::REFLECTION, ocean.reflection_frame_buffer().color_attachment());
    encoder.set_uniform(uniforms::SKY, Vec4::new(services.sky.current_sky_type(), 0.0, 0.0, 0.0));
    encoder.submit(desc.pass, program, Discard::All);
}
