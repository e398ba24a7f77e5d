//! GPU resource wrappers and draw recording
//!
//! Wrappers own their CPU data and create wgpu objects on `upload`.

mod buffer;
pub mod debug_lines;
mod encoder;
mod frame_buffer;
mod gpu;
mod mesh;
pub mod shader;
mod state;
mod texture;
mod vertex;

pub use buffer::{DynamicVertexBuffer, IndexBuffer, IndexFormat, VertexBuffer};
pub use encoder::{
    Discard, DrawState, Encoder, EncoderStats, IndexRange, InstanceRange, RenderPass, Submission,
    TextureBinding, View,
};
pub use frame_buffer::{DEPTH_FORMAT, FrameBuffer};
pub(crate) use frame_buffer::create_depth_texture;
pub use gpu::Gpu;
pub use mesh::{Mesh, Topology};
pub use shader::{ShaderManager, ShaderProgram};
pub use state::RenderState;
pub use texture::{GpuTexture, TEXTURE_FORMAT, Texture2D, TextureError, TextureUsage};
pub use vertex::{
    FootprintVertex, INSTANCE_LAYOUT, LineVertex, ModelVertex, Vertex, VertexLayout, VertexType,
};
