//! Replays recorded passes on the GPU
//!
//! Every draw gets its own slice of one per-frame uniform buffer holding the
//! view, projection, program uniforms and up to [`MAX_TRANSFORMS`] model
//! matrices. Textures are bound as one group of four `(texture, sampler)`
//! stages; empty stages sample a white texture.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::graphics::shader::{MAX_TEXTURE_STAGES, MAX_UNIFORMS};
use crate::graphics::{
    DEPTH_FORMAT, Encoder, FrameBuffer, Gpu, GpuTexture, INSTANCE_LAYOUT, RenderPass, RenderState, ShaderProgram,
    Submission, TEXTURE_FORMAT, Texture2D, View,
};

/// Bone or model matrices one draw can carry
pub(crate) const MAX_TRANSFORMS: usize = 64;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DrawUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    params: [[f32; 4]; MAX_UNIFORMS],
    /// `x` is the number of valid transforms
    info: [u32; 4],
    transforms: [[[f32; 4]; 4]; MAX_TRANSFORMS],
}

const DRAW_UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;

impl DrawUniform {
    fn new(view: &View<'_>, submission: &Submission<'_>) -> Self {
        let mut uniform = Self::zeroed();
        uniform.view = view.view.to_cols_array_2d();
        uniform.projection = view.projection.to_cols_array_2d();

        let program = submission.program;
        for (name, value) in &submission.draw.uniforms {
            match program.uniform_slot(name) {
                Some(slot) => uniform.params[slot] = value.to_array(),
                None => log::trace!("{} does not declare {name}", program.name()),
            }
        }

        let transforms = &submission.draw.transforms;
        if transforms.len() > MAX_TRANSFORMS {
            log::warn!(
                "{}: {} transforms bound, only {MAX_TRANSFORMS} are used",
                program.name(),
                transforms.len()
            );
        }
        if transforms.is_empty() {
            uniform.transforms[0] = Mat4::IDENTITY.to_cols_array_2d();
            uniform.info[0] = 1;
        } else {
            for (slot, matrix) in uniform.transforms.iter_mut().zip(transforms) {
                *slot = matrix.to_cols_array_2d();
            }
            uniform.info[0] = transforms.len().min(MAX_TRANSFORMS) as u32;
        }
        uniform
    }
}

/// Surface image and depth of the current frame
pub(crate) struct BackBuffer<'t> {
    pub color: &'t wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub depth: &'t wgpu::TextureView,
}

struct PassTarget<'t> {
    color: &'t wgpu::TextureView,
    format: wgpu::TextureFormat,
    depth: Option<&'t wgpu::TextureView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: &'static str,
    layout: &'static str,
    state: RenderState,
    format: wgpu::TextureFormat,
    depth: bool,
    wireframe: bool,
}

type TextureKey = [u64; MAX_TEXTURE_STAGES];

struct PreparedDraw<'s, 'a> {
    submission: &'s Submission<'a>,
    pipeline: PipelineKey,
    uniform_offset: u32,
    textures: TextureKey,
}

struct PreparedPass<'s, 'a> {
    pass: RenderPass,
    target: PassTarget<'s>,
    draws: Vec<PreparedDraw<'s, 'a>>,
}

pub(crate) struct Executor {
    module: wgpu::ShaderModule,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,
    white: Texture2D,
    uniform_stride: u64,
    line_polygons: bool,
}

/// `0xRRGGBBAA` to a clear color
pub(crate) fn unpack_color(rgba: u32) -> wgpu::Color {
    let channel = |shift: u32| f64::from((rgba >> shift) & 0xFF) / 255.0;
    wgpu::Color {
        r: channel(24),
        g: channel(16),
        b: channel(8),
        a: channel(0),
    }
}

impl Executor {
    pub fn new(gpu: &Gpu, line_polygons: bool) -> Self {
        let device = &gpu.device;
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("godcore shaders"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let mut texture_entries = Vec::with_capacity(MAX_TEXTURE_STAGES * 2);
        for stage in 0..MAX_TEXTURE_STAGES as u32 {
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: stage * 2,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2Array,
                    multisampled: false,
                },
                count: None,
            });
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: stage * 2 + 1,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Stage Layout"),
            entries: &texture_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Draw Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let mut white = Texture2D::solid_color("white", [255; 4]);
        white.upload(gpu);

        Self {
            module,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            pipelines: FxHashMap::default(),
            white,
            uniform_stride: DRAW_UNIFORM_SIZE.next_multiple_of(alignment),
            line_polygons,
        }
    }

    /// Record every touched pass of `encoder` into `commands`
    pub fn execute(
        &mut self,
        gpu: &Gpu,
        commands: &mut wgpu::CommandEncoder,
        encoder: &Encoder<'_>,
        back_buffer: &BackBuffer<'_>,
        clear_colors: &[u32; 3],
    ) {
        let mut uniforms: Vec<u8> = Vec::new();
        let mut texture_groups: FxHashMap<TextureKey, wgpu::BindGroup> = FxHashMap::default();
        let mut passes = Vec::new();

        for (pass, view) in encoder.views() {
            if !view.touched && view.submissions.is_empty() {
                continue;
            }
            let Some(target) = Self::target(view, back_buffer) else {
                log::error!("{} pass target is not uploaded, skipping", pass.name());
                continue;
            };

            let mut draws = Vec::with_capacity(view.submissions.len());
            for submission in &view.submissions {
                if !is_drawable(submission) {
                    continue;
                }
                let key = PipelineKey {
                    program: submission.program.name(),
                    layout: submission.program.layout().name,
                    state: submission.draw.state,
                    format: target.format,
                    depth: target.depth.is_some(),
                    wireframe: view.wireframe && self.line_polygons,
                };
                if !self.pipelines.contains_key(&key) {
                    let pipeline = self.create_pipeline(gpu, submission.program, &key);
                    self.pipelines.insert(key, pipeline);
                }

                let textures = texture_key(submission);
                if !texture_groups.contains_key(&textures) {
                    let Some(group) = self.texture_group(gpu, submission) else {
                        log::error!("No fallback texture, skipping {}", submission.program.name());
                        continue;
                    };
                    texture_groups.insert(textures, group);
                }

                let offset = uniforms.len();
                uniforms.extend_from_slice(bytemuck::bytes_of(&DrawUniform::new(view, submission)));
                uniforms.resize(offset + self.uniform_stride as usize, 0);
                draws.push(PreparedDraw {
                    submission,
                    pipeline: key,
                    uniform_offset: offset as u32,
                    textures,
                });
            }
            passes.push(PreparedPass { pass, target, draws });
        }

        let uniform_group = (!uniforms.is_empty()).then(|| {
            let buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Draw Uniforms"),
                contents: &uniforms,
                usage: wgpu::BufferUsages::UNIFORM,
            });
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Draw Uniform Group"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                    }),
                }],
            })
        });

        for prepared in &passes {
            let clear = unpack_color(clear_colors[prepared.pass as usize]);
            let mut render_pass = commands.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(prepared.pass.name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: prepared.target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: prepared.target.depth.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(0.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let Some(uniform_group) = &uniform_group else {
                continue;
            };
            for draw in &prepared.draws {
                let (Some(pipeline), Some(textures)) = (
                    self.pipelines.get(&draw.pipeline),
                    texture_groups.get(&draw.textures),
                ) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, uniform_group, &[draw.uniform_offset]);
                render_pass.set_bind_group(1, textures, &[]);
                record_draw(&mut render_pass, draw.submission);
            }
        }
    }

    fn target<'t>(view: &'t View<'_>, back_buffer: &'t BackBuffer<'_>) -> Option<PassTarget<'t>> {
        match view.frame_buffer {
            Some(frame_buffer) => Self::frame_buffer_target(frame_buffer),
            None => Some(PassTarget {
                color: back_buffer.color,
                format: back_buffer.format,
                depth: Some(back_buffer.depth),
            }),
        }
    }

    /// `None` until the frame buffer is uploaded
    fn frame_buffer_target(frame_buffer: &FrameBuffer) -> Option<PassTarget<'_>> {
        let color = frame_buffer.color_attachment().gpu.as_ref()?;
        Some(PassTarget {
            color: &color.attachment_view,
            format: TEXTURE_FORMAT,
            depth: frame_buffer.depth.as_ref().map(|(_, view)| view),
        })
    }

    fn texture_group(&self, gpu: &Gpu, submission: &Submission<'_>) -> Option<wgpu::BindGroup> {
        let white = self.white.gpu.as_ref()?;
        let stages: Vec<&GpuTexture> = (0..MAX_TEXTURE_STAGES as u8)
            .map(|stage| {
                submission
                    .draw
                    .texture(stage)
                    .and_then(|texture| texture.gpu.as_ref())
                    .unwrap_or(white)
            })
            .collect();

        let mut entries = Vec::with_capacity(MAX_TEXTURE_STAGES * 2);
        for (stage, texture) in stages.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: stage as u32 * 2,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: stage as u32 * 2 + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }
        Some(gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Stages"),
            layout: &self.texture_layout,
            entries: &entries,
        }))
    }

    fn create_pipeline(&self, gpu: &Gpu, program: &ShaderProgram, key: &PipelineKey) -> wgpu::RenderPipeline {
        log::debug!("Creating pipeline for {} ({:?})", program.name(), key.state);
        let layouts = [
            program.layout().buffer_layout(wgpu::VertexStepMode::Vertex),
            INSTANCE_LAYOUT.buffer_layout(wgpu::VertexStepMode::Instance),
        ];
        let buffers = if program.is_instanced() {
            &layouts[..]
        } else {
            &layouts[..1]
        };

        gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(program.name()),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some(program.vertex_entry()),
                compilation_options: Default::default(),
                buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some(program.fragment_entry()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: key.state.blend_state(),
                    write_mask: key.state.color_writes(),
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: key.state.topology(),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.state.cull_mode(),
                polygon_mode: if key.wireframe {
                    wgpu::PolygonMode::Line
                } else {
                    wgpu::PolygonMode::Fill
                },
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: key.depth.then(|| wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.state.contains(RenderState::WRITE_Z),
                depth_compare: key.state.depth_compare(),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

fn texture_key(submission: &Submission<'_>) -> TextureKey {
    let mut key = [0; MAX_TEXTURE_STAGES];
    for (stage, slot) in key.iter_mut().enumerate() {
        if let Some(texture) = submission.draw.texture(stage as u8) {
            *slot = texture.id();
        }
    }
    key
}

/// Whether everything a submission reads is bound and uploaded
fn is_drawable(submission: &Submission<'_>) -> bool {
    let program = submission.program;
    let draw = &submission.draw;
    let Some(vertices) = draw.vertex_buffer else {
        log::warn!("{} submitted without a vertex buffer", program.name());
        return false;
    };
    if vertices.buffer.is_none() {
        log::warn!("Vertex buffer {} is not uploaded", vertices.name());
        return false;
    }
    if vertices.layout().name != program.layout().name {
        log::error!(
            "{} expects {} vertices, got {}",
            program.name(),
            program.layout().name,
            vertices.layout().name
        );
        return false;
    }
    if draw.index.is_some_and(|index| index.buffer.buffer.is_none()) {
        log::warn!("Index buffer for {} is not uploaded", vertices.name());
        return false;
    }
    if program.is_instanced() {
        match draw.instances {
            Some(instances) if instances.buffer.buffer.is_some() => {}
            _ => {
                log::warn!("{} needs an uploaded instance buffer", program.name());
                return false;
            }
        }
    }
    true
}

fn record_draw(render_pass: &mut wgpu::RenderPass<'_>, submission: &Submission<'_>) {
    let draw = &submission.draw;
    let Some(vertices) = draw.vertex_buffer.and_then(|v| v.buffer.as_ref()) else {
        return;
    };
    render_pass.set_vertex_buffer(0, vertices.slice(..));

    let instances = match draw.instances {
        Some(range) if submission.program.is_instanced() => {
            let Some(buffer) = range.buffer.buffer.as_ref() else {
                return;
            };
            render_pass.set_vertex_buffer(1, buffer.slice(..));
            range.first..range.first + range.count
        }
        _ => 0..1,
    };

    match draw.index {
        Some(index) => {
            let Some(buffer) = index.buffer.buffer.as_ref() else {
                return;
            };
            render_pass.set_index_buffer(buffer.slice(..), index.buffer.format().to_wgpu());
            render_pass.draw_indexed(index.first..index.first + index.count, 0, instances);
        }
        None => render_pass.draw(0..vertices_count(submission), instances),
    }
}

fn vertices_count(submission: &Submission<'_>) -> u32 {
    submission.draw.vertex_buffer.map_or(0, |v| v.count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{Discard, ShaderManager, VertexBuffer, LineVertex};
    use glam::{Vec3, Vec4};

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(DRAW_UNIFORM_SIZE, 64 + 64 + 64 + 16 + 64 * 64);
        assert_eq!(DRAW_UNIFORM_SIZE % 16, 0);
    }

    #[test]
    fn test_unpack_color() {
        let color = unpack_color(0xFF00_80FF);
        assert!((color.r - 1.0).abs() < 0.0001);
        assert!(color.g.abs() < 0.0001);
        assert!((color.b - 128.0 / 255.0).abs() < 0.0001);
        assert!((color.a - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_uniform_slots_and_default_transform() {
        let shaders = ShaderManager::new();
        let program = shaders.get_shader("Sprite").unwrap();
        let mut encoder = Encoder::new();
        encoder.set_uniform("u_tint", Vec4::new(0.5, 0.25, 1.0, 1.0));
        encoder.set_uniform("u_islandExtent", Vec4::ONE);
        encoder.submit(RenderPass::Main, program, Discard::All);

        let view = encoder.view(RenderPass::Main).unwrap();
        let uniform = DrawUniform::new(view, &view.submissions[0]);
        assert_eq!(uniform.params[1], [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(uniform.params[0], [0.0; 4]);
        assert_eq!(uniform.info[0], 1);
        assert_eq!(uniform.transforms[0], Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn test_transforms_are_truncated() {
        let shaders = ShaderManager::new();
        let program = shaders.get_shader("Object").unwrap();
        let bones = vec![Mat4::from_translation(Vec3::X); MAX_TRANSFORMS + 3];
        let mut encoder = Encoder::new();
        encoder.set_transform(&bones);
        encoder.submit(RenderPass::Main, program, Discard::All);

        let view = encoder.view(RenderPass::Main).unwrap();
        let uniform = DrawUniform::new(view, &view.submissions[0]);
        assert_eq!(uniform.info[0], MAX_TRANSFORMS as u32);
        assert!((uniform.transforms[MAX_TRANSFORMS - 1][3][0] - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_not_uploaded_draws_are_skipped() {
        let shaders = ShaderManager::new();
        let program = shaders.get_shader("DebugLine").unwrap();
        let buffer = VertexBuffer::new("lines", &[LineVertex::new(Vec3::ZERO, Vec4::ONE); 2]);
        let mut encoder = Encoder::new();
        encoder.set_vertex_buffer(&buffer);
        encoder.submit(RenderPass::Main, program, Discard::All);
        encoder.submit(RenderPass::Main, program, Discard::All);

        let submissions = encoder.submissions(RenderPass::Main);
        assert!(!is_drawable(&submissions[0]));
        assert!(!is_drawable(&submissions[1]));
    }

    #[test]
    fn test_pending_frame_buffer_has_no_target() {
        let frame_buffer = FrameBuffer::new("reflection", 64, 64, true);
        let target = {
            let mut encoder = Encoder::new();
            encoder.set_view_frame_buffer(RenderPass::Reflection, Some(&frame_buffer));
            encoder.touch(RenderPass::Reflection);
            let view = encoder.view(RenderPass::Reflection).unwrap();
            view.frame_buffer.and_then(Executor::frame_buffer_target)
        };
        assert!(target.is_none());
    }

    #[test]
    fn test_texture_key_by_stage() {
        let shaders = ShaderManager::new();
        let texture = Texture2D::solid_color("t", [0; 4]);
        let mut encoder = Encoder::new();
        encoder.set_texture(2, "s_reflection", &texture);
        encoder.submit(RenderPass::Main, shaders.get_shader("Water").unwrap(), Discard::All);
        let key = texture_key(&encoder.submissions(RenderPass::Main)[0]);
        assert_eq!(key, [0, 0, texture.id(), 0]);
    }
}
