use std::borrow::Cow;

use super::{DrawSceneDesc, MeshSubmitDesc, SceneServices};
use crate::graphics::{Encoder, RenderState};
use crate::l3d::NO_BONE;
use crate::renderer::Renderer;
use crate::resources::hash_name;

const TEST_MODEL: &str = "coffre";
const TEST_MODEL_STATE: RenderState = RenderState::WRITE_MASK
    .union(RenderState::DEPTH_TEST_GREATER)
    .union(RenderState::CULL_CCW)
    .union(RenderState::MSAA);

pub(super) fn render<'a>(
    renderer: &Renderer,
    encoder: &mut Encoder<'a>,
    services: &SceneServices<'a>,
    desc: &DrawSceneDesc<'a>,
) {
    let Some(program) = services.program("Object") else {
        return;
    };
    let id = hash_name(TEST_MODEL);
    let (Some(mesh), Some(animation)) = (
        services.resources.meshes.get(id),
        services.resources.animations.get(id),
    ) else {
        log::error!("Test model {TEST_MODEL} is not loaded");
        return;
    };

    let parents = mesh.bone_parents();
    let mut bones = animation.bone_matrices(desc.time);
    for i in 0..bones.len() {
        match parents.get(i) {
            Some(&parent) if parent != NO_BONE && (parent as usize) < i => {
                bones[i] = bones[parent as usize] * bones[i];
            }
            _ => {}
        }
    }

    let mut submit = MeshSubmitDesc::new(desc.pass, program, TEST_MODEL_STATE);
    submit.model_matrices = Cow::Owned(bones);
    renderer.draw_mesh(encoder, services, mesh, &submit, 0);
}
