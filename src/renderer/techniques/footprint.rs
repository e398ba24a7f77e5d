use super::{DrawSceneDesc, SceneServices};
use crate::graphics::shader::samplers;
use crate::graphics::{Discard, Encoder, RenderState};
use crate::renderer::Renderer;

const FOOTPRINT_STATE: RenderState = RenderState::WRITE_RGB
    .union(RenderState::WRITE_A)
    .union(RenderState::BLEND_ALPHA)
    .union(RenderState::CULL_CW)
    .union(RenderState::MSAA);

pub(super) fn render<'a>(
    _renderer: &Renderer,
    encoder: &mut Encoder<'a>,
    services: &SceneServices<'a>,
    desc: &DrawSceneDesc<'a>,
) {
    let island = services.island;
    encoder.touch(desc.pass);
    encoder.set_view_transform(desc.pass, island.ortho_view(), island.ortho_proj());

    let Some(program) = services.program("FootprintInstanced") else {
        return;
    };
    let context = services.render_context;
    for (&mesh_id, draw) in &context.instanced_draw_descs {
        let Some(mesh) = services.resources.meshes.get(mesh_id) else {
            continue;
        };
        if !mesh.contains_landscape_feature() {
            continue;
        }
        let Some(footprint) = mesh.footprints().first() else {
            continue;
        };
        encoder.set_texture(0, samplers::DIFFUSE, &footprint.texture);
        encoder.set_vertex_buffer(footprint.mesh.vertex_buffer());
        encoder.set_instance_buffer(&context.instance_uniform_buffer, draw.offset, draw.count);
        encoder.set_state(FOOTPRINT_STATE, 0);
        encoder.submit(desc.pass, program, Discard::All);
    }
}
