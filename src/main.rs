//! waveform-bars - play an audio file as a bar spectrum and record the canvas
//!
//! Keys: O open, R record/stop, S snapshot, Esc quit. Files can also be
//! dropped onto the window or passed on the command line.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use waveform_bars::audio::{CpalOutput, MediaKind};
use waveform_bars::canvas::{gray, Canvas};
use waveform_bars::cli::Args;
use waveform_bars::clock::FrameClock;
use waveform_bars::controls::{Control, ControlStrip};
use waveform_bars::notify::DialogNotifier;
use waveform_bars::params::Config;
use waveform_bars::record::{unique_path, FfmpegFactory, Recorder, Toggle};
use waveform_bars::rendering::{RenderSystem, UiFrame};
use waveform_bars::sketch::{FileDisposition, Sketch};

const SNAPSHOT_NAME: &str = "waveform_bars.png";

/// Main application state
struct App {
    config: Config,
    initial_file: Option<PathBuf>,

    // Window, rendering and the egui control strip
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    egui_ctx: egui::Context,
    egui_state: Option<egui_winit::State>,

    // Sketch, recorder and the pixels they share
    sketch: Sketch<CpalOutput, DialogNotifier>,
    recorder: Recorder<FfmpegFactory>,
    strip: ControlStrip,
    canvas: Canvas,

    redraw_clock: FrameClock,

    failure: Option<Box<dyn Error>>,
}

impl App {
    fn new(config: Config, initial_file: Option<PathBuf>) -> Self {
        let mut canvas = Canvas::new(
            config.canvas.width,
            config.canvas.height,
            gray(config.canvas.background),
        );
        let strip = ControlStrip::new(&config.canvas, &config.controls);

        let sketch = Sketch::new(&config, CpalOutput, DialogNotifier);
        sketch.draw_prompt(&mut canvas);
        let recorder = Recorder::new(
            FfmpegFactory::new(&config.recording),
            config.recording.clone(),
            canvas.width(),
            canvas.height(),
        );

        Self {
            redraw_clock: FrameClock::new(config.canvas.fps),
            config,
            initial_file,
            window: None,
            render_system: None,
            egui_ctx: egui::Context::default(),
            egui_state: None,
            sketch,
            recorder,
            strip,
            canvas,
            failure: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn Error>> {
        let (width, height) = self.strip.frame_size();
        let window_attributes = Window::default_attributes()
            .with_title(self.title())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let canvas_size = (self.canvas.width(), self.canvas.height());
        let render_system =
            pollster::block_on(RenderSystem::new(Arc::clone(&window), canvas_size))?;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &*window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.egui_state = Some(egui_state);
        Ok(())
    }

    fn title(&self) -> String {
        format!("waveform-bars - {}", self.recorder.label())
    }

    fn update_title(&self) {
        if let Some(window) = &self.window {
            window.set_title(&self.title());
        }
    }

    fn load(&mut self, path: PathBuf) {
        if let FileDisposition::Ignored(kind) = self.sketch.handle_file(&path) {
            log::info!("Not an audio file ({:?}): {}", kind, path.display());
        }
    }

    fn open_file_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Open audio file")
            .add_filter("Audio", MediaKind::audio_extensions())
            .add_filter("All files", &["*"])
            .pick_file();
        if let Some(path) = picked {
            self.load(path);
        }
    }

    fn toggle_recording(&mut self) {
        match self.recorder.toggle() {
            Ok(Toggle::Started) => {}
            Ok(Toggle::Saved(path)) => println!("Saved recording to {}", path.display()),
            Err(e) => log::error!("Recording failed: {}", e),
        }
        self.update_title();
    }

    fn save_snapshot(&self) {
        let dir = &self.config.recording.output_dir;
        if let Err(e) = std::fs::create_dir_all(dir) {
            log::error!("Cannot create {}: {}", dir.display(), e);
            return;
        }
        let path = unique_path(dir, SNAPSHOT_NAME);
        match self.canvas.save_png(&path) {
            Ok(()) => println!("Saved snapshot to {}", path.display()),
            Err(e) => log::error!("Snapshot failed: {}", e),
        }
    }

    /// Stop and save an in-progress recording before exit
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        match self.recorder.stop() {
            Ok(Some(path)) => println!("Saved recording to {}", path.display()),
            Ok(None) => {}
            Err(e) => log::error!("Recording failed: {}", e),
        }
        event_loop.exit();
    }

    fn activate(&mut self, control: Control) {
        match control {
            Control::OpenFile => self.open_file_dialog(),
            Control::Record => self.toggle_recording(),
        }
    }

    /// Advance one tick and present it
    fn render_frame(&mut self) {
        let now = Instant::now();

        self.sketch.update();
        self.sketch.redraw(&mut self.canvas);

        if let Err(e) = self.recorder.capture(&self.canvas, now) {
            log::error!("Recording stopped: {}", e);
            self.update_title();
        }

        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };
        let raw_input = egui_state.take_egui_input(window);
        let recording = self.recorder.is_recording();
        let strip = &self.strip;
        let mut clicked = None;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            clicked = strip.show(ctx, recording);
        });
        egui_state.handle_platform_output(window, full_output.platform_output);

        let ui = UiFrame {
            primitives: self
                .egui_ctx
                .tessellate(full_output.shapes, full_output.pixels_per_point),
            textures: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
            reserved_bottom: self.strip.strip_height(),
        };

        if let Some(render_system) = &mut self.render_system {
            if let Err(e) = render_system.render(&self.canvas, ui) {
                log::error!("Render error: {:?}", e);
            }
        }

        if let Some(control) = clicked {
            self.activate(control);
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if self.redraw_clock.tick(now) {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
        let deadline = self
            .redraw_clock
            .deadline()
            .unwrap_or(now + self.redraw_clock.interval());
        event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.init_window(event_loop) {
            log::error!("Startup failed: {}", e);
            self.failure = Some(e);
            event_loop.exit();
            return;
        }

        println!("\nwaveform-bars is running!");
        println!("O: open file  R: record  S: snapshot  ESC: quit\n");

        if let Some(path) = self.initial_file.take() {
            self.load(path);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (&self.window, &mut self.egui_state) {
            (Some(window), Some(egui_state)) => egui_state.on_window_event(window, &event).consumed,
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } if !consumed => match code {
                KeyCode::Escape => self.shutdown(event_loop),
                KeyCode::KeyO => self.open_file_dialog(),
                KeyCode::KeyR => self.toggle_recording(),
                KeyCode::KeyS => self.save_snapshot(),
                _ => {}
            },
            WindowEvent::DroppedFile(path) => self.load(path),
            WindowEvent::RedrawRequested => self.render_frame(),
            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.to_config();
    config.validate()?;

    let mut app = App::new(config, args.file);
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
