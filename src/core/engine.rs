//! Core Engine struct and main loop

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use super::config::EngineConfig;
use super::stats::FrameStats;
use crate::ecs::{PrepareScene, RenderingSystem, RenderingSystemCommon, RenderingSystemInterface, World};
use crate::environment::{
    LandIsland, LandIslandInterface, Ocean, OceanInterface, Sky, SkyError, SkyInterface,
};
use crate::graphics::{Encoder, ShaderManager, TextureError};
use crate::renderer::{BuiltinMeshes, Camera, DrawSceneDesc, Renderer, RendererError, SceneServices};
use crate::resources::Resources;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Sky(#[from] SkyError),
    #[error("failed to build the island: {0}")]
    Island(#[from] TextureError),
    #[error(transparent)]
    Renderer(#[from] RendererError),
    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Game trait that users implement
pub trait Game: 'static {
    /// Load resources and populate the world. GPU objects are created after this returns.
    fn init(&mut self, engine: &mut EngineContext);

    /// Called every frame before the scene is drawn
    fn update(&mut self, engine: &mut EngineContext, delta: Duration);

    fn on_key(&mut self, _engine: &mut EngineContext, _key: KeyCode, _pressed: bool) {}

    /// Called when the window is resized
    fn on_resize(&mut self, _engine: &mut EngineContext, _width: u32, _height: u32) {}

    /// Called when the game is shutting down
    fn shutdown(&mut self, _engine: &mut EngineContext) {}
}

/// Everything a frame draws from, passed to game callbacks
pub struct EngineContext {
    pub config: EngineConfig,
    pub resources: Resources,
    pub shaders: ShaderManager,
    pub world: World,
    pub rendering: RenderingSystemCommon,
    pub sky: Sky,
    pub ocean: Ocean,
    pub island: LandIsland,
    pub builtin: BuiltinMeshes,
    pub camera: Camera,
    pub stats: FrameStats,
    renderer: Option<Renderer>,
    pressed: FxHashSet<KeyCode>,
    start: Instant,
    window_size: PhysicalSize<u32>,
    should_quit: bool,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let mut sky = Sky::new()?;
        sky.set_time_of_day(config.render.time_of_day);
        let mut camera = Camera::new();
        camera.set_aspect(config.width, config.height);
        Ok(Self {
            window_size: PhysicalSize::new(config.width, config.height),
            config,
            resources: Resources::new(),
            shaders: ShaderManager::new(),
            world: World::new(),
            rendering: RenderingSystem::new(None),
            sky,
            ocean: Ocean::new(),
            island: LandIsland::flat(1, 1)?,
            builtin: BuiltinMeshes::new(),
            camera,
            stats: FrameStats::new(),
            renderer: None,
            pressed: FxHashSet::default(),
            start: Instant::now(),
            should_quit: false,
        })
    }

    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut Renderer> {
        self.renderer.as_mut()
    }

    /// Install the renderer and create GPU objects for everything loaded so far
    pub fn attach_renderer(&mut self, renderer: Renderer) {
        if let Some(gpu) = renderer.gpu() {
            self.resources.upload(&gpu);
            self.sky.upload(&gpu);
            self.ocean.upload(&gpu);
            self.island.upload(&gpu);
            self.builtin.upload(&gpu);
            self.rendering = RenderingSystem::new(Some(gpu));
        }
        self.renderer = Some(renderer);
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Milliseconds since the engine started
    pub fn elapsed_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    pub fn width(&self) -> u32 {
        self.window_size.width
    }

    pub fn height(&self) -> u32 {
        self.window_size.height
    }

    /// Save the next frame to the configured screenshot path
    pub fn screenshot(&mut self) {
        let path = PathBuf::from(&self.config.screenshot_path);
        if let Some(renderer) = &mut self.renderer {
            renderer.request_screenshot(path);
        }
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.window_size = PhysicalSize::new(width, height);
        self.camera.set_aspect(width, height);
        if let Some(renderer) = &mut self.renderer {
            renderer.reset(width, height);
        }
    }

    /// Rebuild instances if needed, record every pass and present
    pub fn draw(&mut self) -> Result<(), RendererError> {
        let time = self.elapsed_ms();
        let settings = &self.config.render;
        self.sky.set_time_of_day(settings.time_of_day);
        self.rendering.prepare_draw(
            &PrepareScene {
                world: &self.world,
                meshes: &self.resources.meshes,
                camera_origin: self.camera.position,
            },
            settings.draw_bounding_boxes,
            settings.draw_footpaths,
            settings.draw_streams,
        );

        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        let services = SceneServices {
            resources: &self.resources,
            shaders: &self.shaders,
            render_context: self.rendering.context(),
            world: &self.world,
            sky: &self.sky,
            ocean: &self.ocean,
            island: &self.island,
            builtin: &self.builtin,
        };
        let mut desc = DrawSceneDesc::new(self.camera.clone());
        settings.apply(&mut desc);
        desc.time = time;

        let mut encoder = Encoder::new();
        renderer.draw_scene(&mut encoder, &services, &desc);
        self.stats.record_draw(encoder.stats());
        renderer.frame(encoder)
    }
}

/// Main engine struct
pub struct Engine<G: Game> {
    game: G,
    context: EngineContext,
    window: Option<Arc<Window>>,
    last_frame: Instant,
    error: Option<EngineError>,
}

impl<G: Game> Engine<G> {
    pub fn new(config: EngineConfig, game: G) -> Result<Self, EngineError> {
        Ok(Self {
            game,
            context: EngineContext::new(config)?,
            window: None,
            last_frame: Instant::now(),
            error: None,
        })
    }

    /// Open the window and run until it closes
    pub fn run(mut self) -> Result<(), EngineError> {
        env_logger::init();
        log::info!("Starting engine: {}", self.context.config.title);

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;

        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: EngineError) {
        log::error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn frame_interval(&self) -> Option<Duration> {
        let config = &self.context.config;
        (config.target_fps > 0 && !config.vsync).then(|| Duration::from_secs_f64(1.0 / f64::from(config.target_fps)))
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.context.stats.record_frame(delta);

        self.game.update(&mut self.context, delta);
        if self.context.should_quit() {
            self.game.shutdown(&mut self.context);
            event_loop.exit();
            return;
        }

        if let Err(err) = self.context.draw() {
            self.fail(event_loop, err.into());
            return;
        }
        if self.context.stats.total_frames() % 600 == 0 {
            log::debug!("{}", self.context.stats.format_stats());
        }
    }
}

impl<G: Game> ApplicationHandler for Engine<G> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let config = &self.context.config;
        let window_attrs = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(config.width, config.height));
        let vsync = config.vsync;

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, err.into()),
        };
        let renderer = match pollster::block_on(Renderer::new(Arc::clone(&window), vsync)) {
            Ok(renderer) => renderer,
            Err(err) => return self.fail(event_loop, err.into()),
        };
        self.window = Some(window);

        self.game.init(&mut self.context);
        self.context.attach_renderer(renderer);
        self.last_frame = Instant::now();
        log::info!("Engine initialized successfully");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                self.game.shutdown(&mut self.context);
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    self.context.resize(new_size.width, new_size.height);
                    self.game
                        .on_resize(&mut self.context, new_size.width, new_size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    if pressed {
                        self.context.pressed.insert(key_code);
                    } else {
                        self.context.pressed.remove(&key_code);
                    }
                    if !event.repeat {
                        self.game.on_key(&mut self.context, key_code, pressed);
                    }
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };
        match self.frame_interval() {
            Some(interval) => {
                let next = self.last_frame + interval;
                if Instant::now() >= next {
                    window.request_redraw();
                } else {
                    event_loop.set_control_flow(ControlFlow::WaitUntil(next));
                }
            }
            None => window.request_redraw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Texture2D;
    use crate::renderer::Technique;

    fn context() -> EngineContext {
        let mut context = EngineContext::new(EngineConfig::default().with_size(64, 64)).unwrap();
        for name in ["raw/sea", "raw/seaalpha", "raw/smallbumpa"] {
            context
                .resources
                .textures
                .load(name, Texture2D::solid_color(name, [255; 4]));
        }
        context
    }

    #[test]
    fn test_draw_without_renderer_only_prepares() {
        let mut context = context();
        context.draw().unwrap();
        assert_eq!(context.rendering.rebuilds(), 1);
        assert_eq!(context.stats.last_draw().submits, 0);
    }

    #[test]
    fn test_headless_frame_records_sky() {
        let mut context = context();
        context.config.render.techniques = Technique::SKY;
        context.attach_renderer(Renderer::headless(64, 64));
        context.draw().unwrap();
        assert_eq!(context.renderer().map(Renderer::frames), Some(1));
        assert!(context.stats.last_draw().submits > 0);
    }

    #[test]
    fn test_resize_updates_camera() {
        let mut context = context();
        context.attach_renderer(Renderer::headless(64, 64));
        context.resize(200, 100);
        assert!((context.camera.aspect - 2.0).abs() < 0.0001);
        assert_eq!(context.renderer().map(Renderer::size), Some((200, 100)));
        assert_eq!(context.width(), 200);
    }

    #[test]
    fn test_sky_follows_config_time() {
        let mut context = context();
        context.config.render.time_of_day = 18.0;
        context.draw().unwrap();
        assert!((context.sky.time_of_day() - 18.0).abs() < 0.0001);
    }
}
