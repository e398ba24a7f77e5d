use std::borrow::Cow;

use super::{DrawSceneDesc, IDENTITY, MeshSubmitDesc, SceneServices};
use crate::graphics::{Discard, Encoder, InstanceRange, RenderPass, RenderState};
use crate::renderer::{ALL_SUB_MESHES, Renderer};

const ENTITY_STATE: RenderState = RenderState::WRITE_MASK
    .union(RenderState::DEPTH_TEST_GREATER)
    .union(RenderState::MSAA);
const OVERLAY_STATE: RenderState = RenderState::DEFAULT_INVERTED_Z.union(RenderState::PT_LINES);

pub(super) fn render<'a>(
    renderer: &Renderer,
    encoder: &mut Encoder<'a>,
    services: &SceneServices<'a>,
    desc: &DrawSceneDesc<'a>,
) {
    let (Some(flat), Some(morphing)) = (
        services.program("ObjectInstanced"),
        services.program("ObjectHeightMapInstanced"),
    ) else {
        return;
    };
    let context = services.render_context;
    let meshes = &services.resources.meshes;

    for (&mesh_id, draw) in &context.instanced_draw_descs {
        let Some(mesh) = meshes.get(mesh_id) else {
            log::error!("Mesh {mesh_id:#010x} is not loaded");
            continue;
        };
        let program = if draw.morph_with_terrain { morphing } else { flat };
        let mut submit = MeshSubmitDesc::new(desc.pass, program, ENTITY_STATE);
        submit.instances = Some(InstanceRange {
            buffer: &context.instance_uniform_buffer,
            first: draw.offset,
            count: draw.count,
        });
        // TODO: bind the current animation frame instead of the rest pose
        submit.model_matrices = if mesh.is_boned() {
            Cow::Borrowed(mesh.bone_matrices())
        } else {
            Cow::Borrowed(IDENTITY)
        };
        submit.morph_with_terrain = draw.morph_with_terrain;
        renderer.draw_mesh(encoder, services, mesh, &submit, ALL_SUB_MESHES);
    }

    if desc.pass != RenderPass::Main {
        return;
    }
    let (Some(lines), Some(lines_instanced)) = (
        services.program("DebugLine"),
        services.program("DebugLineInstanced"),
    ) else {
        return;
    };

    if let Some(bounding_box) = context.bounding_box.as_ref().filter(|_| desc.draw_bounding_boxes) {
        let (first, count) = context.bounding_box_range();
        encoder.set_vertex_buffer(bounding_box.vertex_buffer());
        encoder.set_instance_buffer(&context.instance_uniform_buffer, first, count);
        encoder.set_state(OVERLAY_STATE, 0);
        encoder.submit(desc.pass, lines_instanced, Discard::All);
    }
    for overlay in [&context.footpaths, &context.streams].into_iter().flatten() {
        encoder.set_vertex_buffer(overlay.vertex_buffer());
        encoder.set_state(OVERLAY_STATE, 0);
        encoder.submit(desc.pass, lines, Discard::All);
    }
}
