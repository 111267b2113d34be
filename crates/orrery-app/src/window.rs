//! Window creation and event handling via winit.
//!
//! [`AppState`] implements winit's [`ApplicationHandler`]: it creates the
//! window and GPU context on resume, forwards input to the [`Viewer`], runs
//! the fixed-timestep loop and renders once per redraw.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use orrery_config::{CliArgs, Config};
use orrery_input::{InputMap, KeyboardState, MouseState};
use orrery_render::{
    Camera, RenderContext, RendererSettings, SceneRenderer, SurfaceError,
    init_render_context_blocking,
};
use orrery_system::FpsCounter;
use orrery_system::scene::generate_stars;
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::game_loop::GameLoop;
use crate::publish_client::PublishClient;
use crate::viewer::Viewer;

const CONFIG_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Window attributes for `config`.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// `prefix | hud | status`, skipping the empty parts.
pub fn compose_title(prefix: &str, hud: Option<&str>, status: Option<&str>) -> String {
    [Some(prefix), hud, status]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Where the config came from and the command line applied on top of it.
#[derive(Debug, Clone)]
pub struct ConfigWatch {
    pub dir: PathBuf,
    pub overrides: CliArgs,
}

pub struct AppState {
    config: Config,
    watch: Option<ConfigWatch>,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    renderer: Option<SceneRenderer>,
    game_loop: GameLoop,
    viewer: Viewer,
    keyboard_state: KeyboardState,
    mouse_state: MouseState,
    fps: FpsCounter,
    publisher: PublishClient,
    last_title: String,
    last_config_poll: Instant,
}

impl AppState {
    pub fn new(config: Config, input_map: InputMap) -> Self {
        let viewer = Viewer::new(&config, input_map);
        let publisher = PublishClient::new(
            config.server_url(),
            Duration::from_secs(config.server.request_timeout_seconds.max(1)),
        );
        Self {
            viewer,
            publisher,
            watch: None,
            window: None,
            gpu: None,
            renderer: None,
            game_loop: GameLoop::new(),
            keyboard_state: KeyboardState::new(),
            mouse_state: MouseState::new(),
            fps: FpsCounter::default(),
            last_title: String::new(),
            last_config_poll: Instant::now(),
            config,
        }
    }

    /// Poll `watch.dir` for config edits while running.
    pub fn watch_config(mut self, watch: ConfigWatch) -> Self {
        self.watch = Some(watch);
        self
    }

    fn init_renderer(&mut self, ctx: &RenderContext) {
        let scene = &self.config.scene;
        let stars = generate_stars(
            scene.seed,
            scene.star_count as usize,
            scene.star_radius,
            scene.star_depth,
        );
        let settings = RendererSettings {
            sphere_subdivisions: scene.sphere_subdivisions,
            ring_segments: scene.ring_segments,
        };
        self.renderer = Some(SceneRenderer::new(ctx, settings, &stars));
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            // Minimized: hold the clock so the first frame back does not
            // burn a backlog of steps.
            self.game_loop.reset_clock();
            return;
        }
        self.viewer.resize(width, height);
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(&gpu.device, width, height);
            }
        }
        info!("Window resized to {width}x{height}");
    }

    fn poll_config(&mut self) {
        let Some(watch) = &self.watch else {
            return;
        };
        if self.last_config_poll.elapsed() < CONFIG_POLL_INTERVAL {
            return;
        }
        self.last_config_poll = Instant::now();
        match self.config.reload_with_overrides(&watch.dir, &watch.overrides) {
            Ok(Some(new_config)) => {
                if new_config.debug.show_fps != self.config.debug.show_fps {
                    info!("FPS display {}", if new_config.debug.show_fps { "on" } else { "off" });
                }
                self.config = new_config;
            }
            Ok(None) => {}
            Err(e) => warn!("Config reload failed: {e}"),
        }
    }

    fn update_title(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let fps = self.config.debug.show_fps.then(|| self.fps.fps());
        let hud = self.viewer.hud(fps);
        let title = compose_title(&self.config.window.title, hud.as_deref(), self.publisher.status());
        if title != self.last_title {
            window.set_title(&title);
            self.last_title = title;
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.poll_config();

        for flow in self.viewer.handle_input(&self.keyboard_state, &self.mouse_state) {
            self.publisher.submit(flow);
        }
        self.publisher.drain_results();

        let viewer = &mut self.viewer;
        self.game_loop.tick(|dt| viewer.fixed_update(dt));
        self.fps.tick(Instant::now());

        if let (Some(gpu), Some(renderer)) = (&mut self.gpu, &mut self.renderer) {
            let camera = Camera::from_view(&self.viewer.camera_view(), gpu.aspect_ratio());
            let items = self.viewer.items();
            match renderer.render(gpu, &camera, &items) {
                Ok(_) => {}
                Err(SurfaceError::Lost) => {
                    let (w, h) = gpu.size();
                    gpu.resize(w, h);
                }
                Err(SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(SurfaceError::Timeout) => {
                    warn!("Surface timeout, skipping frame");
                }
            }
        }
        self.update_title();

        self.keyboard_state.clear_transients();
        self.mouse_state.clear_transients();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(ctx) => {
                self.init_renderer(&ctx);
                let (w, h) = ctx.size();
                self.viewer.resize(w, h);
                self.gpu = Some(ctx);
            }
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        }
        info!("{}", self.viewer.panel_text());
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.publisher.close();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.handle_resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    info!("Scale factor changed to {scale_factor:.2}");
                    self.handle_resize(size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => self.keyboard_state.release_all(),
            WindowEvent::KeyboardInput { event, .. } => {
                self.keyboard_state.process_event(&event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_state.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_state.on_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.mouse_state.on_scroll(delta);
            }
            WindowEvent::CursorEntered { .. } => {
                self.mouse_state.on_cursor_entered();
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_state.on_cursor_left();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Create the event loop and run until the window closes.
#[instrument(skip_all)]
pub fn run_with_config(
    config: Config,
    input_map: InputMap,
    watch: Option<ConfigWatch>,
) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::new(config, input_map);
    if let Some(watch) = watch {
        app = app.watch_config(watch);
    }
    event_loop.run_app(&mut app)
}
