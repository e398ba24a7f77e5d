use glam::{Mat4, Vec4};

use super::{DrawSceneDesc, SceneServices};
use crate::ecs::{Sprite, Transform};
use crate::graphics::shader::{samplers, uniforms};
use crate::graphics::{Discard, Encoder, RenderState};
use crate::renderer::Renderer;

const SPRITE_STATE: RenderState = RenderState::DEPTH_TEST_GREATER
    .union(RenderState::WRITE_RGB)
    .union(RenderState::WRITE_A)
    .union(RenderState::BLEND_ADD);

pub(super) fn render<'a>(
    _renderer: &Renderer,
    encoder: &mut Encoder<'a>,
    services: &SceneServices<'a>,
    desc: &DrawSceneDesc<'a>,
) {
    let Some(program) = services.program("Sprite") else {
        return;
    };
    let plane = &services.builtin.plane;

    let mut query = services.world.query::<(&Sprite, &Transform)>();
    for (_, (sprite, transform)) in query.iter() {
        let Some(texture) = services.resources.textures.get(sprite.texture) else {
            log::error!("Sprite texture {:#010x} is not loaded", sprite.texture);
            continue;
        };
        let model = Mat4::from_translation(transform.position)
            * Mat4::from_quat(transform.rotation)
            * Mat4::from_scale(transform.scale);

        encoder.set_transform(&[model]);
        let sample_rect = Vec4::new(sprite.uv_extent.x, sprite.uv_extent.y, sprite.uv_min.x, sprite.uv_min.y);
        encoder.set_uniform(uniforms::SAMPLE_RECT, sample_rect);
        encoder.set_uniform(uniforms::TINT, sprite.tint);
        encoder.set_texture(0, samplers::DIFFUSE, texture);
        if let Some(indices) = plane.index_buffer() {
            encoder.set_index_buffer(indices, 0, indices.count());
        }
        encoder.set_vertex_buffer(plane.vertex_buffer());
        encoder.set_state(SPRITE_STATE, 0);
        encoder.submit(desc.pass, program, Discard::All);
    }
}
