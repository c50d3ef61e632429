//! Psyche - a camera-fed ego sphere with two orbiting companions
//!
//! The ego wears your webcam (or a stand-in), the id and superego circle
//! overhead, and an ocean floor ripples underneath. Click to look around,
//! Escape to let go.

use std::sync::Arc;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use psyche::cli::{Args, FeedSource};
use psyche::clock::Clock;
use psyche::feed::devices::{NoDevices, StillImageDevices, TestPatternDevices};
use psyche::feed::{Acquisition, CameraFeedAcquirer};
use psyche::look::{LookController, MoveKey, SpectatorIntegrator};
use psyche::params::{FeedConfig, LookConfig, RenderConfig, SceneLayout};
use psyche::rendering::RenderSystem;
use psyche::scene::{Scene, SceneContext};
use psyche::scheduler::{AnimationScheduler, PrimaryBody};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation
    ctx: SceneContext,
    scheduler: AnimationScheduler,

    // Configuration
    render_config: RenderConfig,
    feed_config: FeedConfig,
    layout: SceneLayout,
    feed_source: FeedSource,
    feed_image: Option<std::path::PathBuf>,
}

impl App {
    fn new(args: &Args) -> Self {
        let render_config = args.render_config();
        let layout = SceneLayout::default();
        let look = LookController::new(SpectatorIntegrator::new(LookConfig::default()));

        let mut ctx = SceneContext::new(&render_config);
        let mut scheduler = AnimationScheduler::new(Clock::new(), look, &layout);
        scheduler.populate(&mut ctx.scene, &layout);

        Self {
            window: None,
            render_system: None,
            ctx,
            scheduler,
            render_config,
            feed_config: args.feed_config(),
            layout,
            feed_source: args.feed_source(),
            feed_image: args.feed_image.clone(),
        }
    }

    /// Request the camera and install whichever primary body results
    fn acquire_primary(&mut self) {
        let scene = &mut self.ctx.scene;
        let config = self.feed_config;
        let outcome = match (self.feed_source, &self.feed_image) {
            (FeedSource::TestPattern, _) => block_on_acquire(
                CameraFeedAcquirer::new(TestPatternDevices::default(), config),
                scene,
                &self.layout,
            ),
            (FeedSource::Image, Some(path)) => block_on_acquire(
                CameraFeedAcquirer::new(StillImageDevices::new(path.clone()), config),
                scene,
                &self.layout,
            ),
            _ => block_on_acquire(
                CameraFeedAcquirer::new(NoDevices, config),
                scene,
                &self.layout,
            ),
        };

        let primary = PrimaryBody::from_acquisition(outcome, scene, &self.layout);
        if let Some(PrimaryBody::CameraFeed(mut old)) = self.scheduler.install_primary(scene, primary)
        {
            old.stop_camera();
        }
    }

    fn capture_pointer(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                window.set_cursor_visible(false);
                self.scheduler.look_mut().on_capture_acquired();
            }
            Err(e) => log::warn!("Pointer capture refused: {}", e),
        }
    }

    fn release_pointer(&mut self) {
        if let Some(window) = &self.window {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                log::debug!("Releasing pointer capture failed: {}", e);
            }
            window.set_cursor_visible(true);
        }
        self.scheduler.look_mut().on_capture_lost();
    }

    fn handle_key(&mut self, code: KeyCode, state: ElementState, repeat: bool) {
        let pressed = state == ElementState::Pressed;
        if let Some(key) = move_key(code) {
            self.scheduler.look_mut().set_key(key, pressed);
            return;
        }
        if !pressed || repeat {
            return;
        }

        let scene = &mut self.ctx.scene;
        let Some(feed) = self.scheduler.camera_feed() else {
            return;
        };
        let applied = match code {
            KeyCode::Digit1 => feed.step_opacity(scene, -1.0),
            KeyCode::Digit2 => feed.step_opacity(scene, 1.0),
            KeyCode::Digit3 => feed.toggle_distortion(scene),
            _ => return,
        };
        if let Some(value) = applied {
            log::info!("{:?} -> {:.2}", code, value);
        }
    }
}

fn block_on_acquire<D: psyche::feed::MediaDevices>(
    acquirer: CameraFeedAcquirer<D>,
    scene: &mut Scene,
    layout: &SceneLayout,
) -> Acquisition {
    pollster::block_on(acquirer.acquire(scene, layout))
}

fn move_key(code: KeyCode) -> Option<MoveKey> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(MoveKey::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(MoveKey::Back),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(MoveKey::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(MoveKey::Right),
        KeyCode::Space => Some(MoveKey::Up),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(MoveKey::Down),
        _ => None,
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("Psyche")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let render_system = match pollster::block_on(RenderSystem::new(Arc::clone(&window))) {
            Ok(render_system) => render_system,
            Err(e) => {
                log::error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.ctx.resize(size.width, size.height);

        self.window = Some(window);
        self.render_system = Some(render_system);

        self.acquire_primary();

        log::info!("Psyche is running");
        log::info!("Click to look around, WASD to move, 1/2 opacity, 3 distortion, Esc to release");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.scheduler.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.ctx.resize(size.width, size.height);
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => self.release_pointer(),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if !self.scheduler.look().is_enabled() {
                    self.capture_pointer();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.release_pointer(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(code),
                        repeat,
                        ..
                    },
                ..
            } => self.handle_key(code, state, repeat),
            WindowEvent::RedrawRequested => {
                let Some(render_system) = &mut self.render_system else {
                    return;
                };
                self.scheduler.tick(&mut self.ctx, render_system);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.scheduler.look_mut().push_look_delta(dx as f32, dy as f32);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.scheduler.teardown();
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Psyche starting (feed: {:?})", args.feed);

    let mut app = App::new(&args);
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}
