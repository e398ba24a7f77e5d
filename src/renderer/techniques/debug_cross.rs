use super::{DrawSceneDesc, SceneServices};
use crate::ecs::DebugCross;
use crate::graphics::{Discard, Encoder, RenderState};
use crate::renderer::Renderer;

pub(super) fn render<'a>(
    _renderer: &Renderer,
    encoder: &mut Encoder<'a>,
    services: &SceneServices<'a>,
    desc: &DrawSceneDesc<'a>,
) {
    let Some(program) = services.program("DebugLine") else {
        return;
    };
    let cross = &services.builtin.cross;

    let mut query = services.world.query::<&DebugCross>();
    for (_, debug_cross) in query.iter() {
        encoder.set_transform(&[debug_cross.pose]);
        encoder.set_vertex_buffer(cross.vertex_buffer());
        encoder.set_state(RenderState::DEFAULT_INVERTED_Z | RenderState::PT_LINES, 0);
        encoder.submit(desc.pass, program, Discard::All);
    }
}
