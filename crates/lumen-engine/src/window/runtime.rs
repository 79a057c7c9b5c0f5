use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::ControllerConfig;
use crate::controller::{PerformanceController, PerformanceState};
use crate::device::{WgpuGraphics, WgpuInit};
use crate::engine::{AudioSink, RenderEngine};
use crate::profile::PlatformHints;

/// A render engine the desktop host can drive.
///
/// Must work against a [`WgpuGraphics`] of any window lifetime, since the
/// backend borrows the window it was created for.
pub trait HostedEngine: for<'w> RenderEngine<WgpuGraphics<'w>> + 'static {
    /// Called for key presses the host does not handle itself.
    fn on_key(&mut self, _key: KeyCode) {}
}

/// Audio reaching the controller from a capture thread.
///
/// Chunks queued on `pcm` are drained on the render thread once per frame
/// and forwarded through [`PerformanceController::add_pcm`] to `sink`.
pub struct AudioInput {
    pub sink: Arc<dyn AudioSink>,
    pub pcm: Receiver<Vec<i16>>,
}

impl fmt::Debug for AudioInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioInput").finish_non_exhaustive()
    }
}

/// Window/host configuration.
#[derive(Debug)]
pub struct HostConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Passed to [`RenderEngine::init`] on surface creation.
    pub preset_path: String,
    pub hints: PlatformHints,
    pub controller: ControllerConfig,
    pub wgpu: WgpuInit,
    /// Overrides the tier's default mode once the surface exists.
    pub performance_mode: Option<bool>,
    pub audio: Option<AudioInput>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            preset_path: String::new(),
            hints: PlatformHints::new("desktop", false),
            controller: ControllerConfig::default(),
            wgpu: WgpuInit::default(),
            performance_mode: None,
            audio: None,
        }
    }
}

/// Entry point for the desktop host.
///
/// Keys: `P` toggles Performance mode, `T` trims the asset cache, `Escape`
/// quits. Everything else goes to [`HostedEngine::on_key`].
pub struct Host;

impl Host {
    pub fn run<E: HostedEngine>(config: HostConfig, engine: E) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = HostState::new(config, engine);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct SurfaceEntry<E: 'static> {
    window: Window,

    #[borrows(window)]
    #[not_covariant]
    controller: PerformanceController<WgpuGraphics<'this>, E>,
}

struct HostState<E: HostedEngine> {
    config: HostConfig,
    engine: Option<E>,

    entry: Option<SurfaceEntry<E>>,
    pcm: Option<Receiver<Vec<i16>>>,
    shown: Option<PerformanceState>,
    next_frame: Instant,
    exit_requested: bool,
}

impl<E: HostedEngine> HostState<E> {
    fn new(config: HostConfig, engine: E) -> Self {
        Self {
            config,
            engine: Some(engine),
            entry: None,
            pcm: None,
            shown: None,
            next_frame: Instant::now(),
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(entry) = self.entry.as_mut() {
            entry.with_controller_mut(|c| c.destroy());
        }
        self.entry = None;
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let engine = self.engine.take().context("render engine already consumed")?;

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let init = self.config.wgpu.clone();
        let hints = self.config.hints.clone();
        let controller_config = self.config.controller.clone();
        let (sink, pcm) = match self.config.audio.take() {
            Some(AudioInput { sink, pcm }) => (Some(sink), Some(pcm)),
            None => (None, None),
        };
        self.pcm = pcm;

        let entry = SurfaceEntryTryBuilder {
            window,
            controller_builder: |window| {
                pollster::block_on(WgpuGraphics::new(window, init)).map(|gfx| {
                    let controller = PerformanceController::new(gfx, engine, hints, controller_config);
                    match sink {
                        Some(sink) => controller.with_audio_sink(sink),
                        None => controller,
                    }
                })
            },
        }
        .try_build()
        .context("GPU initialization failed")?;

        self.entry = Some(entry);
        self.start_surface();
        Ok(())
    }

    /// Hands the current window size to the controller as a new surface.
    fn start_surface(&mut self) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        let preset = self.config.preset_path.as_str();
        let forced = self.config.performance_mode;

        entry.with_mut(|fields| {
            let (w, h) = signed(fields.window.inner_size());
            let controller = fields.controller;
            controller.on_surface_created(w, h, preset);
            if let Some(enabled) = forced {
                controller.set_performance_mode(enabled);
            }
            if controller.audio_sink().is_none() {
                log::info!("no audio input attached; visuals run without PCM");
            }
            fields.window.request_redraw();
        });
        self.shown = None;
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        entry.with_controller_mut(|controller| {
            controller.gfx_mut().resize(size);
            // Minimized windows report zero; keep the last real size.
            if size.width > 0 && size.height > 0 {
                let (w, h) = signed(size);
                controller.on_surface_changed(w, h);
            }
        });
        entry.with_window(|w| w.request_redraw());
    }

    fn draw(&mut self) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let pcm = self.pcm.as_ref();
        let state = entry.with_controller_mut(|controller| {
            if let Some(pcm) = pcm {
                drain_pcm(pcm, |chunk| controller.add_pcm(chunk));
            }
            controller.on_draw_frame();
            controller.state()
        });

        let period = Duration::from_secs_f64(1.0 / f64::from(state.target_fps.max(1)));
        self.next_frame = Instant::now() + period;

        if self.shown != Some(state) {
            let title = format!("{} | {}", self.config.title, describe(&state));
            entry.with_window(|w| w.set_title(&title));
            self.shown = Some(state);
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        if key == KeyCode::Escape {
            self.request_exit(event_loop);
            return;
        }

        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        entry.with_controller_mut(|controller| match key {
            KeyCode::KeyP => {
                let enabled = !controller.is_performance_mode_enabled();
                controller.set_performance_mode(enabled);
            }
            KeyCode::KeyT => {
                let evicted = controller.trim_memory();
                log::info!("trimmed {evicted} cached assets");
            }
            other => controller.engine_mut().on_key(other),
        });
    }
}

impl<E: HostedEngine> ApplicationHandler for HostState<E> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            self.start_surface();
            return;
        }

        if let Err(e) = self.create_entry(event_loop) {
            log::error!("failed to create initial window: {e:#}");
            self.request_exit(event_loop);
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(entry) = self.entry.as_mut() {
            entry.with_controller_mut(|c| c.on_surface_destroyed());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Paced to the controller's target frame rate.
        if Instant::now() >= self.next_frame {
            if let Some(entry) = self.entry.as_ref() {
                entry.with_window(|w| w.request_redraw());
            }
            event_loop.set_control_flow(ControlFlow::Wait);
        } else {
            event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::Resized(new_size) => self.resize(new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size()));
                if let Some(size) = size {
                    self.resize(size);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.on_key(event_loop, code);
                    }
                }
            }

            WindowEvent::RedrawRequested => self.draw(),

            _ => {}
        }
    }
}

/// Forwards every queued chunk without blocking. Returns the chunk count.
fn drain_pcm(pcm: &Receiver<Vec<i16>>, mut forward: impl FnMut(&[i16])) -> usize {
    let mut chunks = 0;
    while let Ok(chunk) = pcm.try_recv() {
        forward(&chunk);
        chunks += 1;
    }
    chunks
}

fn signed(size: PhysicalSize<u32>) -> (i32, i32) {
    let clamp = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
    (clamp(size.width), clamp(size.height))
}

fn describe(state: &PerformanceState) -> String {
    let mut text = format!(
        "{} {}x{} | {} fps target",
        state.mode, state.render_width, state.render_height, state.target_fps
    );
    if state.escape_count > 0 {
        text.push_str(&format!(" | {} escapes", state.escape_count));
    }
    if state.blit_faulted {
        text.push_str(" | quad");
    }
    text
}
