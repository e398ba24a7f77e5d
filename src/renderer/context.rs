//! Scene renderer
//!
//! Passes are recorded into an [`Encoder`] by the techniques and replayed on
//! the GPU by [`Renderer::frame`]. A renderer created with
//! [`Renderer::headless`] records exactly the same draws but never touches a
//! device.

use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec4;
use smallvec::SmallVec;
use winit::window::Window;

use super::executor::{BackBuffer, Executor};
use super::screenshot::Readback;
use super::techniques::{DrawSceneDesc, MeshSubmitDesc, SceneServices, TECHNIQUES, Technique};
use crate::graphics::shader::{samplers, uniforms};
use crate::graphics::{Discard, Encoder, Gpu, RenderPass, Texture2D, create_depth_texture};
use crate::l3d::NO_SKIN;
use crate::mesh::{L3dMesh, L3dSubMesh};

/// Submesh index meaning "every drawable submesh"
pub const ALL_SUB_MESHES: u8 = u8::MAX;

/// Texture array layers the albedo and sky textures need
const MIN_TEXTURE_LAYERS: u32 = 4;

const DEFAULT_CLEAR_COLORS: [u32; 3] = [
    0x0000_0000, // footprints blend over transparent black
    0x2746_59ff,
    0x2746_59ff,
];

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("graphics device supports {0} texture array layers, {MIN_TEXTURE_LAYERS} are required")]
    TextureLayers(u32),
    #[error("failed to acquire frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),
    #[error("screenshot readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
    #[error("screenshot readback was dropped")]
    ReadbackDropped,
    #[error("failed to write screenshot: {0}")]
    Screenshot(#[from] image::ImageError),
}

struct Backend {
    gpu: Arc<Gpu>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth: (wgpu::Texture, wgpu::TextureView),
    executor: Executor,
    readable: bool,
}

pub struct Renderer {
    backend: Option<Backend>,
    clear_colors: [u32; 3],
    size: (u32, u32),
    screenshot: Option<PathBuf>,
    frames: u64,
}

/// Skip collision geometry, status variants and low-detail levels
fn is_drawn(sub_mesh: &L3dSubMesh, draw_all: bool) -> bool {
    let flags = sub_mesh.flags();
    draw_all || !(flags.is_physics || flags.status != 0 || flags.lod_mask & 1 != 1)
}

/// Mesh skin first, then the global texture table
fn resolve_skin<'a>(mesh: &'a L3dMesh, services: &SceneServices<'a>, skin_id: u32) -> Option<&'a Texture2D> {
    if skin_id == NO_SKIN {
        return None;
    }
    let texture = mesh
        .skins()
        .get(&skin_id)
        .or_else(|| services.resources.textures.get(skin_id));
    if texture.is_none() {
        log::error!("{}: skin {skin_id:#010x} is not loaded", mesh.name());
    }
    texture
}

impl Renderer {
    /// Create a renderer drawing into `window`
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RendererError> {
        let size = window.inner_size();
        let size = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::NoAdapter)?;
        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let layers = adapter.limits().max_texture_array_layers;
        if layers < MIN_TEXTURE_LAYERS {
            return Err(RendererError::TextureLayers(layers));
        }

        let line_polygons = adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if line_polygons {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            log::warn!("Wireframe rendering is not supported by this adapter");
            wgpu::Features::empty()
        };
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("godcore device"),
                    required_features,
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;
        device.on_uncaptured_error(Box::new(|error| {
            log::error!("GPU error: {error}");
            panic!("GPU error: {error}");
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RendererError::NoSurfaceFormat)?;
        let readable = surface_caps.usages.contains(wgpu::TextureUsages::COPY_SRC);
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if readable {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format,
            width: size.0,
            height: size.1,
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let gpu = Arc::new(Gpu::new(device, queue));
        let depth = create_depth_texture(&gpu.device, size.0, size.1);
        let executor = Executor::new(&gpu, line_polygons);

        Ok(Self {
            backend: Some(Backend {
                gpu,
                surface,
                config,
                depth,
                executor,
                readable,
            }),
            clear_colors: DEFAULT_CLEAR_COLORS,
            size,
            screenshot: None,
            frames: 0,
        })
    }

    /// Renderer that records draws without a device
    pub fn headless(width: u32, height: u32) -> Self {
        Self {
            backend: None,
            clear_colors: DEFAULT_CLEAR_COLORS,
            size: (width.max(1), height.max(1)),
            screenshot: None,
            frames: 0,
        }
    }

    pub fn gpu(&self) -> Option<Arc<Gpu>> {
        self.backend.as_ref().map(|backend| Arc::clone(&backend.gpu))
    }

    pub fn is_headless(&self) -> bool {
        self.backend.is_none()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Frames submitted so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Set the `0xRRGGBBAA` color `pass` is cleared to
    pub fn configure_view(&mut self, pass: RenderPass, clear_color: u32) {
        self.clear_colors[pass as usize] = clear_color;
    }

    /// Resize the back buffer
    pub fn reset(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        if let Some(backend) = &mut self.backend {
            backend.config.width = width;
            backend.config.height = height;
            backend.surface.configure(&backend.gpu.device, &backend.config);
            backend.depth = create_depth_texture(&backend.gpu.device, width, height);
        }
        log::debug!("Resized to {width}x{height}");
    }

    /// Save the next frame to `path`
    pub fn request_screenshot(&mut self, path: impl Into<PathBuf>) {
        self.screenshot = Some(path.into());
    }

    /// Footprints, then the water reflection when water is drawn, then the main view
    pub fn draw_scene<'a>(
        &self,
        encoder: &mut Encoder<'a>,
        services: &SceneServices<'a>,
        desc: &DrawSceneDesc<'a>,
    ) {
        let mut footprint = desc.clone();
        footprint.pass = RenderPass::Footprint;
        footprint.frame_buffer = Some(services.island.footprint_frame_buffer());
        footprint.techniques = desc.techniques & Technique::FOOTPRINT;
        self.draw_pass(encoder, services, &footprint);

        if desc.techniques.contains(Technique::WATER) {
            let ocean = services.ocean;
            let mut reflection = desc.clone();
            reflection.pass = RenderPass::Reflection;
            reflection.camera = desc.camera.reflect(ocean.reflection_plane());
            reflection.frame_buffer = Some(ocean.reflection_frame_buffer());
            reflection.techniques =
                desc.techniques - (Technique::WATER | Technique::DEBUG_CROSS | Technique::FOOTPRINT);
            reflection.draw_bounding_boxes = false;
            reflection.cull_back = true;
            self.draw_pass(encoder, services, &reflection);
        }

        let mut main = desc.clone();
        main.techniques = desc.techniques - Technique::FOOTPRINT;
        self.draw_pass(encoder, services, &main);
    }

    /// Run the requested techniques into one pass
    pub fn draw_pass<'a>(
        &self,
        encoder: &mut Encoder<'a>,
        services: &SceneServices<'a>,
        desc: &DrawSceneDesc<'a>,
    ) {
        if let Some(frame_buffer) = desc.frame_buffer {
            encoder.set_view_frame_buffer(desc.pass, Some(frame_buffer));
        }
        encoder.touch(desc.pass);
        encoder.set_view_wireframe(desc.pass, desc.wireframe);
        encoder.set_view_transform(
            desc.pass,
            desc.camera.view_matrix(),
            desc.camera.projection_matrix(),
        );

        for (technique, name, render) in TECHNIQUES {
            if desc.techniques.contains(technique) {
                log::trace!("{} pass: {name}", desc.pass.name());
                render(self, encoder, services, desc);
            }
        }
    }

    /// Draw one submesh of `mesh`, or all drawable ones with [`ALL_SUB_MESHES`]
    pub fn draw_mesh<'a>(
        &self,
        encoder: &mut Encoder<'a>,
        services: &SceneServices<'a>,
        mesh: &'a L3dMesh,
        desc: &MeshSubmitDesc<'a>,
        sub_mesh_index: u8,
    ) {
        let sub_meshes = mesh.sub_meshes();
        if sub_meshes.is_empty() {
            log::warn!("{} has no submeshes to draw", mesh.name());
            return;
        }

        if sub_mesh_index != ALL_SUB_MESHES {
            let Some(sub_mesh) = sub_meshes.get(usize::from(sub_mesh_index)) else {
                log::warn!(
                    "{}: submesh {sub_mesh_index} out of range ({} submeshes)",
                    mesh.name(),
                    sub_meshes.len()
                );
                return;
            };
            self.draw_sub_mesh(encoder, services, mesh, sub_mesh, desc, false, None);
            return;
        }

        let drawn: SmallVec<[&'a L3dSubMesh; 8]> = sub_meshes
            .iter()
            .filter(|sub_mesh| is_drawn(sub_mesh, desc.draw_all))
            .collect();
        for (i, sub_mesh) in drawn.iter().enumerate() {
            let next = drawn.get(i + 1);
            let next_texture = next
                .and_then(|next| next.primitives().first())
                .and_then(|primitive| resolve_skin(mesh, services, primitive.skin_id));
            self.draw_sub_mesh(encoder, services, mesh, sub_mesh, desc, next.is_some(), next_texture);
        }
    }

    /// Submit every primitive of `sub_mesh`.
    ///
    /// Consecutive primitives sharing a texture keep their bindings; only the
    /// index range changes between them. `preserve_state` extends that to the
    /// first primitive of the next submesh, whose texture is `next_texture`.
    #[allow(clippy::too_many_arguments)]
    fn draw_sub_mesh<'a>(
        &self,
        encoder: &mut Encoder<'a>,
        services: &SceneServices<'a>,
        mesh: &'a L3dMesh,
        sub_mesh: &'a L3dSubMesh,
        desc: &MeshSubmitDesc<'a>,
        preserve_state: bool,
        next_texture: Option<&'a Texture2D>,
    ) {
        if !is_drawn(sub_mesh, desc.draw_all) {
            return;
        }
        let primitives = sub_mesh.primitives();
        let gpu_mesh = sub_mesh.mesh();
        let textures: SmallVec<[Option<&'a Texture2D>; 8]> = primitives
            .iter()
            .map(|primitive| resolve_skin(mesh, services, primitive.skin_id))
            .collect();

        let island = services.island;
        let extent = island.extent();
        let island_extent = Vec4::new(
            extent.minimum.x,
            extent.minimum.y,
            extent.maximum.x,
            extent.maximum.y,
        );
        let sky_type = services.sky.current_sky_type();

        let mut last_preserve = false;
        for (i, primitive) in primitives.iter().enumerate() {
            let texture = textures[i];
            let has_next = i + 1 < primitives.len();
            let next = if has_next { textures[i + 1] } else { next_texture };
            let preserve = match (texture, next) {
                (Some(current), Some(next)) => {
                    std::ptr::eq(current, next) && (has_next || preserve_state)
                }
                _ => false,
            };

            if !last_preserve {
                if !desc.model_matrices.is_empty() {
                    encoder.set_transform(&desc.model_matrices);
                }
                if let Some(texture) = texture {
                    encoder.set_texture(0, samplers::DIFFUSE, texture);
                }
                if desc.morph_with_terrain {
                    encoder.set_texture(1, samplers::HEIGHTMAP, island.height_map());
                    encoder.set_uniform(uniforms::ISLAND_EXTENT, island_extent);
                }
                if !desc.is_sky {
                    let threshold = if primitive.threshold_alpha {
                        primitive.alpha_cutout_threshold
                    } else {
                        0.0
                    };
                    encoder.set_uniform(
                        uniforms::SKY_ALPHA_THRESHOLD,
                        Vec4::new(sky_type, threshold, 0.0, 0.0),
                    );
                }
            }

            if let Some(instances) = desc.instances {
                encoder.set_instance_buffer(instances.buffer, instances.first, instances.count);
            }
            if let Some(indices) = gpu_mesh.index_buffer() {
                encoder.set_index_buffer(indices, primitive.indices_offset, primitive.indices_count);
            }
            if !last_preserve {
                encoder.set_vertex_buffer(gpu_mesh.vertex_buffer());
                encoder.set_state(desc.state, desc.rgba);
            }

            let discard = if preserve { Discard::None } else { Discard::All };
            encoder.submit(desc.pass, desc.program, discard);
            last_preserve = preserve;
        }
    }

    /// Replay `encoder` on the GPU and present
    pub fn frame(&mut self, encoder: Encoder<'_>) -> Result<(), RendererError> {
        self.frames += 1;
        let Some(backend) = &mut self.backend else {
            log::trace!("Headless frame {}: {} submits", self.frames, encoder.stats().submits);
            if let Some(path) = self.screenshot.take() {
                log::warn!("Cannot save {} without a GPU", path.display());
            }
            return Ok(());
        };

        let output = match backend.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                backend.surface.configure(&backend.gpu.device, &backend.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring a frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let gpu = Arc::clone(&backend.gpu);
        let mut commands = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        let back_buffer = BackBuffer {
            color: &view,
            format: backend.config.format,
            depth: &backend.depth.1,
        };
        backend
            .executor
            .execute(&gpu, &mut commands, &encoder, &back_buffer, &self.clear_colors);

        let readback = match self.screenshot.take() {
            Some(path) if backend.readable => Readback::record(&gpu, &mut commands, &output.texture, path),
            Some(path) => {
                log::warn!("Surface cannot be read back, not saving {}", path.display());
                None
            }
            None => None,
        };

        gpu.queue.submit(std::iter::once(commands.finish()));
        let saved = readback.map(|readback| readback.save(&gpu));
        output.present();
        saved.transpose()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{DebugCross, RenderContext, World};
    use crate::environment::{LandIsland, LandIslandInterface, Ocean, OceanInterface, Sky};
    use crate::graphics::{RenderState, ShaderManager, Submission};
    use crate::l3d::{L3dFile, L3dMaterial, L3dMeshFlags, L3dTexture, L3dVertex, PrimitiveData, SubmeshFlags};
    use crate::renderer::{BuiltinMeshes, Camera};
    use crate::resources::Resources;
    use glam::{Mat4, Vec2, Vec3};

    struct Scene {
        resources: Resources,
        shaders: ShaderManager,
        context: RenderContext,
        world: World,
        sky: Sky,
        ocean: Ocean,
        island: LandIsland,
        builtin: BuiltinMeshes,
    }

    impl Scene {
        fn new() -> Self {
            let mut resources = Resources::new();
            for name in ["raw/sea", "raw/seaalpha", "raw/smallbumpa"] {
                resources.textures.load(name, Texture2D::solid_color(name, [255; 4]));
            }
            Self {
                resources,
                shaders: ShaderManager::new(),
                context: RenderContext::new(),
                world: World::new(),
                sky: Sky::new().unwrap(),
                ocean: Ocean::with_reflection_size(16),
                island: LandIsland::flat(1, 1).unwrap(),
                builtin: BuiltinMeshes::new(),
            }
        }

        fn services(&self) -> SceneServices<'_> {
            SceneServices {
                resources: &self.resources,
                shaders: &self.shaders,
                render_context: &self.context,
                world: &self.world,
                sky: &self.sky,
                ocean: &self.ocean,
                island: &self.island,
                builtin: &self.builtin,
            }
        }
    }

    fn quad(skin_id: u32) -> PrimitiveData {
        PrimitiveData {
            material: L3dMaterial {
                kind: 2,
                skin_id,
                alpha_cutout_threshold: 0,
            },
            vertices: (0..4)
                .map(|i| {
                    let position = Vec3::new((i % 2) as f32, (i / 2) as f32, if i == 3 { 1.0 } else { 0.0 });
                    L3dVertex::new(position, Vec2::ZERO, Vec3::Z)
                })
                .collect(),
            indices: vec![0, 1, 2, 2, 1, 3],
            groups: vec![],
        }
    }

    fn model(sub_meshes: &[(SubmeshFlags, [u32; 2])]) -> L3dMesh {
        let mut file = L3dFile::new("model", L3dMeshFlags::empty());
        for &(flags, [a, b]) in sub_meshes {
            file.add_submesh(flags, vec![quad(a), quad(b)]);
        }
        file.add_skin(L3dTexture::solid(7, 0xFFFF));
        file.add_skin(L3dTexture::solid(8, 0xF00F));
        L3dMesh::load(&file).unwrap()
    }

    fn discards(submissions: &[Submission<'_>]) -> Vec<Discard> {
        submissions.iter().map(|s| s.discard).collect()
    }

    #[test]
    fn test_shared_skin_preserves_across_sub_meshes() {
        let scene = Scene::new();
        let services = scene.services();
        let mesh = model(&[(SubmeshFlags::drawable(), [7, 7]), (SubmeshFlags::drawable(), [7, 7])]);
        let renderer = Renderer::headless(64, 64);
        let program = scene.shaders.get_shader("Object").unwrap();
        let submit = MeshSubmitDesc::new(RenderPass::Main, program, RenderState::DEFAULT_INVERTED_Z);

        let mut encoder = Encoder::new();
        renderer.draw_mesh(&mut encoder, &services, &mesh, &submit, ALL_SUB_MESHES);

        let submissions = encoder.submissions(RenderPass::Main);
        assert_eq!(
            discards(submissions),
            vec![Discard::None, Discard::None, Discard::None, Discard::All]
        );
        let stats = encoder.stats();
        assert_eq!(stats.submits, 4);
        assert_eq!(stats.index_buffer_binds, 4);
        assert_eq!(stats.vertex_buffer_binds, 2);
        assert_eq!(stats.state_binds, 2);
        assert_eq!(stats.texture_binds, 2);
        assert_eq!(submissions[2].draw.index.unwrap().first, 0);
        assert_eq!(submissions[1].draw.index.unwrap().first, 6);
    }

    #[test]
    fn test_single_sub_mesh_does_not_preserve_past_its_end() {
        let scene = Scene::new();
        let services = scene.services();
        let mesh = model(&[(SubmeshFlags::drawable(), [7, 7]), (SubmeshFlags::drawable(), [7, 7])]);
        let renderer = Renderer::headless(64, 64);
        let program = scene.shaders.get_shader("Object").unwrap();
        let submit = MeshSubmitDesc::new(RenderPass::Main, program, RenderState::DEFAULT_INVERTED_Z);

        let mut encoder = Encoder::new();
        renderer.draw_mesh(&mut encoder, &services, &mesh, &submit, 1);
        assert_eq!(
            discards(encoder.submissions(RenderPass::Main)),
            vec![Discard::None, Discard::All]
        );
    }

    #[test]
    fn test_texture_change_rebinds() {
        let scene = Scene::new();
        let services = scene.services();
        let mesh = model(&[(SubmeshFlags::drawable(), [7, 8])]);
        let renderer = Renderer::headless(64, 64);
        let program = scene.shaders.get_shader("Object").unwrap();
        let submit = MeshSubmitDesc::new(RenderPass::Main, program, RenderState::DEFAULT_INVERTED_Z);

        let mut encoder = Encoder::new();
        renderer.draw_mesh(&mut encoder, &services, &mesh, &submit, ALL_SUB_MESHES);
        let submissions = encoder.submissions(RenderPass::Main);
        assert_eq!(discards(submissions), vec![Discard::All, Discard::All]);
        assert_eq!(encoder.stats().vertex_buffer_binds, 2);
        assert_ne!(
            submissions[0].draw.texture(0).map(Texture2D::id),
            submissions[1].draw.texture(0).map(Texture2D::id)
        );
    }

    #[test]
    fn test_physics_sub_meshes_need_draw_all() {
        let scene = Scene::new();
        let services = scene.services();
        let mesh = model(&[(SubmeshFlags::physics(), [7, 7]), (SubmeshFlags::drawable(), [8, 8])]);
        let renderer = Renderer::headless(64, 64);
        let program = scene.shaders.get_shader("Object").unwrap();
        let mut submit = MeshSubmitDesc::new(RenderPass::Main, program, RenderState::DEFAULT_INVERTED_Z);

        let mut encoder = Encoder::new();
        renderer.draw_mesh(&mut encoder, &services, &mesh, &submit, ALL_SUB_MESHES);
        assert_eq!(encoder.stats().submits, 2);

        submit.draw_all = true;
        let mut encoder = Encoder::new();
        renderer.draw_mesh(&mut encoder, &services, &mesh, &submit, ALL_SUB_MESHES);
        assert_eq!(encoder.stats().submits, 4);
    }

    #[test]
    fn test_out_of_range_and_empty_meshes_draw_nothing() {
        let scene = Scene::new();
        let services = scene.services();
        let renderer = Renderer::headless(64, 64);
        let program = scene.shaders.get_shader("Object").unwrap();
        let submit = MeshSubmitDesc::new(RenderPass::Main, program, RenderState::DEFAULT_INVERTED_Z);

        let mesh = model(&[(SubmeshFlags::drawable(), [7, 7])]);
        let empty = L3dMesh::load(&L3dFile::new("empty", L3dMeshFlags::empty())).unwrap();
        let mut encoder = Encoder::new();
        renderer.draw_mesh(&mut encoder, &services, &mesh, &submit, 5);
        renderer.draw_mesh(&mut encoder, &services, &empty, &submit, ALL_SUB_MESHES);
        assert_eq!(encoder.stats().submits, 0);
    }

    #[test]
    fn test_morphing_binds_height_map() {
        let scene = Scene::new();
        let services = scene.services();
        let mesh = model(&[(SubmeshFlags::drawable(), [7, 7])]);
        let renderer = Renderer::headless(64, 64);
        let program = scene.shaders.get_shader("Object").unwrap();
        let mut submit = MeshSubmitDesc::new(RenderPass::Main, program, RenderState::DEFAULT_INVERTED_Z);
        submit.morph_with_terrain = true;

        let mut encoder = Encoder::new();
        renderer.draw_mesh(&mut encoder, &services, &mesh, &submit, 0);
        let draw = &encoder.submissions(RenderPass::Main)[1].draw;
        assert_eq!(draw.texture(1).map(Texture2D::id), Some(scene.island.height_map().id()));
        assert_eq!(
            draw.uniform(uniforms::ISLAND_EXTENT),
            Some(Vec4::new(0.0, 0.0, 160.0, 160.0))
        );
    }

    #[test]
    fn test_reflection_pass_only_with_water() {
        let mut scene = Scene::new();
        scene.world.spawn((DebugCross { pose: Mat4::IDENTITY },));
        let services = scene.services();
        let renderer = Renderer::headless(64, 64);

        let mut desc = DrawSceneDesc::new(Camera::look_at(Vec3::new(0.0, 50.0, 0.0), Vec3::X * 100.0, Vec3::Y));
        let mut encoder = Encoder::new();
        renderer.draw_scene(&mut encoder, &services, &desc);

        let program_names = |pass: RenderPass| -> Vec<&'static str> {
            encoder
                .submissions(pass)
                .iter()
                .map(|s| s.program.name())
                .collect()
        };
        let reflection = program_names(RenderPass::Reflection);
        let main = program_names(RenderPass::Main);
        assert!(!reflection.contains(&"Water"));
        assert!(!reflection.contains(&"DebugLine"));
        assert!(main.contains(&"Water"));
        assert!(main.contains(&"DebugLine"));
        let reflection_view = encoder.view(RenderPass::Reflection).unwrap();
        assert_eq!(
            reflection_view.frame_buffer.map(|fb| fb.id()),
            Some(scene.ocean.reflection_frame_buffer().id())
        );

        desc.techniques.remove(Technique::WATER);
        let mut encoder = Encoder::new();
        renderer.draw_scene(&mut encoder, &services, &desc);
        assert!(encoder.view(RenderPass::Reflection).is_none());
        assert!(encoder.view(RenderPass::Footprint).is_some_and(|view| view.touched));
    }

    #[test]
    fn test_bounding_boxes_follow_desc() {
        let mut scene = Scene::new();
        scene.context.bounding_box = Some(crate::graphics::debug_lines::create_box(Vec4::ONE));
        let services = scene.services();
        let renderer = Renderer::headless(64, 64);
        let count_boxes = |desc: &DrawSceneDesc<'_>| {
            let mut encoder = Encoder::new();
            renderer.draw_pass(&mut encoder, &services, desc);
            encoder
                .submissions(RenderPass::Main)
                .iter()
                .filter(|s| s.program.name() == "DebugLineInstanced")
                .count()
        };

        let mut desc = DrawSceneDesc::new(Camera::new());
        desc.techniques = Technique::ENTITIES;
        assert_eq!(count_boxes(&desc), 0);
        desc.draw_bounding_boxes = true;
        assert_eq!(count_boxes(&desc), 1);
    }

    #[test]
    fn test_techniques_run_in_table_order() {
        let scene = Scene::new();
        let services = scene.services();
        let renderer = Renderer::headless(64, 64);
        let mut desc = DrawSceneDesc::new(Camera::new());
        desc.techniques = Technique::ISLAND | Technique::SKY | Technique::WATER;

        let mut encoder = Encoder::new();
        renderer.draw_pass(&mut encoder, &services, &desc);
        let names: Vec<&str> = encoder
            .submissions(RenderPass::Main)
            .iter()
            .map(|s| s.program.name())
            .collect();
        assert_eq!(names, vec!["Sky", "Water", "Terrain"]);
    }

    #[test]
    fn test_headless_frame() {
        let mut renderer = Renderer::headless(0, 0);
        assert!(renderer.is_headless());
        assert!(renderer.gpu().is_none());
        assert_eq!(renderer.size(), (1, 1));
        renderer.request_screenshot("shot.png");
        renderer.frame(Encoder::new()).unwrap();
        renderer.reset(320, 200);
        assert_eq!(renderer.size(), (320, 200));
        assert_eq!(renderer.frames(), 1);
    }
}
