use glam::Vec4;

use super::{DrawSceneDesc, SceneServices};
use crate::environment::{BLOCK_SIZE, SMALL_BUMP_TEXTURE_ID};
use crate::graphics::shader::{samplers, uniforms};
use crate::graphics::{Discard, Encoder, RenderState};
use crate::renderer::Renderer;

const BLOCK_STATE: RenderState = RenderState::WRITE_MASK
    .union(RenderState::DEPTH_TEST_GREATER)
    .union(RenderState::BLEND_ALPHA)
    .union(RenderState::MSAA);

pub(super) fn render<'a>(
    _renderer: &Renderer,
    encoder: &mut Encoder<'a>,
    services: &SceneServices<'a>,
    desc: &DrawSceneDesc<'a>,
) {
    let Some(program) = services.program("Terrain") else {
        return;
    };
    let Some(small_bump) = services.resources.textures.get(SMALL_BUMP_TEXTURE_ID) else {
        log::error!("Small bump texture is not loaded");
        return;
    };
    let island = services.island;
    let extent = island.extent();

    // Bound once, kept across every block
    encoder.set_texture(0, samplers::MATERIALS, island.albedo_array());
    encoder.set_texture(1, samplers::BUMP, island.bump());
    encoder.set_texture(2, samplers::SMALL_BUMP, small_bump);
    encoder.set_texture(3, samplers::FOOTPRINTS, island.footprint_frame_buffer().color_attachment());
    encoder.set_uniform(
        uniforms::SKY_AND_BUMP,
        Vec4::new(
            services.sky.current_sky_type(),
            desc.bump_map_strength,
            desc.small_bump_map_strength,
            0.0,
        ),
    );
    encoder.set_uniform(
        uniforms::ISLAND_EXTENT,
        Vec4::new(extent.minimum.x, extent.minimum.y, extent.maximum.x, extent.maximum.y),
    );

    let cull = if desc.cull_back {
        RenderState::CULL_CCW
    } else {
        RenderState::CULL_CW
    };
    for block in island.blocks() {
        encoder.set_uniform(
            uniforms::BLOCK_POSITION_AND_SIZE,
            Vec4::new(block.map_position.x, block.map_position.y, BLOCK_SIZE, BLOCK_SIZE),
        );
        if let Some(indices) = block.mesh.index_buffer() {
            encoder.set_index_buffer(indices, 0, indices.count());
        }
        encoder.set_vertex_buffer(block.mesh.vertex_buffer());
        encoder.set_state(BLOCK_STATE | cull, 0);
        encoder.submit(desc.pass, program, Discard::None);
    }
    encoder.discard();
}
