use ab_glyph::FontVec;
use anyhow::{Context, Result};
use mentrot_assets::AssetRegistry;
use mentrot_core::source::StimulusSizes;
use mentrot_experiment::{CsvResultSink, Key, SessionConfig, SessionRunner};
use mentrot_render::TaskRenderer;
use mentrot_timing::{Clock, MonotonicClock};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::sync::Arc;
use std::time::Duration;
use tiny_skia::Pixmap;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

type Session = SessionRunner<MonotonicClock, ThreadRng, StimulusSizes, CsvResultSink>;

/// Frame pacing interval, roughly 60 Hz.
const FRAME_MS: u64 = 16;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    canvas: Pixmap,
    renderer: TaskRenderer,
    registry: AssetRegistry,
    session: Session,
    clock: MonotonicClock,
    /// Last cursor position in buffer coordinates.
    cursor: Option<(f32, f32)>,
    last_frame_ms: u64,
}

impl App {
    pub fn new(registry: AssetRegistry, font: FontVec) -> Result<Self> {
        let config = SessionConfig::default();
        let (width, height) = (config.screen_width, config.screen_height);
        let clock = MonotonicClock::new();
        let session = SessionRunner::new(
            config,
            clock,
            rand::rng(),
            registry.size_table(),
            CsvResultSink::new("."),
        );
        let canvas = Pixmap::new(width, height).context("canvas allocation")?;

        Ok(Self {
            window: None,
            pixels: None,
            canvas,
            renderer: TaskRenderer::new(width, height, font),
            registry,
            session,
            clock,
            cursor: None,
            last_frame_ms: 0,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;

        println!("=== MENTAL ROTATION TASK ===");
        println!("Platform: {}", std::env::consts::OS);
        println!("Press any key to begin, ESC or window close to quit.\n");

        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (width, height) = (
            self.session.config.screen_width,
            self.session.config.screen_height,
        );
        let window_attributes = Window::default_attributes()
            .with_title("Mental Rotation Task")
            .with_inner_size(LogicalSize::new(width as f64, height as f64))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(width, height, surface_texture)?);

        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let Some(pixels) = self.pixels.as_mut() else {
            return Ok(());
        };
        let scene = self.session.scene();
        self.renderer
            .render_frame(&mut self.canvas, &scene, &self.registry)?;

        pixels.frame_mut().copy_from_slice(self.canvas.data());
        pixels.render()?;
        Ok(())
    }

    /// One frame: advance timed state, draw, pace to ~60 Hz.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.session.update() {
            eprintln!("Session error: {e:#}");
            event_loop.exit();
            return;
        }
        if self.session.phase.is_done() {
            self.cleanup_and_exit(event_loop);
            return;
        }
        if let Err(e) = self.render() {
            eprintln!("Render error: {e:#}");
        }

        let elapsed = self.clock.elapsed_ms(self.last_frame_ms);
        if elapsed < FRAME_MS {
            self.clock.sleep(Duration::from_millis(FRAME_MS - elapsed));
        }
        self.last_frame_ms = self.clock.now_ms();

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn handle_keyboard(&mut self, key: winit::keyboard::PhysicalKey, event_loop: &ActiveEventLoop) {
        use winit::keyboard::{KeyCode, PhysicalKey};
        let key = match key {
            PhysicalKey::Code(KeyCode::Escape) => {
                self.cleanup_and_exit(event_loop);
                return;
            }
            PhysicalKey::Code(KeyCode::Space) => Key::Space,
            _ => Key::Other,
        };
        if let Err(e) = self.session.handle_key(key) {
            eprintln!("Session error: {e:#}");
            event_loop.exit();
        }
    }

    fn handle_pointer_down(&mut self, event_loop: &ActiveEventLoop) {
        let Some(pos) = self.cursor else {
            return;
        };
        if let Err(e) = self.session.handle_pointer(pos) {
            eprintln!("Session error: {e:#}");
            event_loop.exit();
        }
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        println!("\nSession ended.");
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                eprintln!("Failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => self.frame(event_loop),
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                self.handle_keyboard(event.physical_key, event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = self
                    .pixels
                    .as_ref()
                    .and_then(|p| {
                        p.window_pos_to_pixel((position.x as f32, position.y as f32))
                            .ok()
                    })
                    .map(|(x, y)| (x as f32, y as f32));
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => self.handle_pointer_down(event_loop),
            WindowEvent::Resized(new_size) => {
                if let Some(pixels) = &mut self.pixels {
                    if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                        eprintln!("Failed to resize surface: {e}");
                    }
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let (Some(pixels), Some(window)) = (&mut self.pixels, &self.window) {
                    let size = window.inner_size();
                    if let Err(e) = pixels.resize_surface(size.width, size.height) {
                        eprintln!("Failed to resize surface: {e}");
                    }
                }
            }
            _ => {}
        }
    }
}
