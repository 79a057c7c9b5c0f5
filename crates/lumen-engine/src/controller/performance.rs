use std::sync::Arc;

use crate::compositor::Compositor;
use crate::config::ControllerConfig;
use crate::coords::Extent;
use crate::engine::{AudioSink, RenderEngine};
use crate::escape::EscapeDetector;
use crate::gfx::{Capabilities, DrawTarget, GraphicsApi};
use crate::latch::Latch;
use crate::memory::{BoundedCache, MemoryGovernor};
use crate::policy::{compute_render_resolution, default_mode, PerformanceMode};
use crate::profile::{classify, DeviceProfile, DeviceTier, PlatformHints};
use crate::target::OffscreenTargetManager;
use crate::time::{FpsMeter, FrameClock};

use super::{FrameReport, PerformanceState};

/// Facts resolved at the first surface creation and kept for the controller's
/// lifetime.
#[derive(Debug)]
struct Session {
    profile: DeviceProfile,
    compositor: Compositor,
    governor: MemoryGovernor,
}

/// Initial frame-rate target per tier.
const fn initial_fps(tier: DeviceTier) -> u32 {
    match tier {
        DeviceTier::High => 60,
        DeviceTier::Mid => 30,
        DeviceTier::Low => 24,
    }
}

#[derive(Debug, Default)]
struct Warnings {
    no_surface: Latch,
    engine_render: Latch,
    engine_hint: Latch,
    begin_frame: Latch,
    end_frame: Latch,
    resolution_in_direct: Latch,
    fps_clamped: Latch,
}

/// Adaptive render-performance controller.
///
/// Owns the graphics backend and the render engine. Every method runs on the
/// thread that owns the graphics context; the only cross-thread entry point is
/// the attached [`AudioSink`].
///
/// No method returns an error: failures turn into a mode or strategy change
/// plus a one-shot log line.
pub struct PerformanceController<G, E> {
    gfx: G,
    engine: E,
    hints: PlatformHints,
    config: ControllerConfig,
    audio: Option<Arc<dyn AudioSink>>,

    session: Option<Session>,
    display: Option<Extent>,

    mode: PerformanceMode,
    render_extent: Extent,
    custom_resolution: Option<Extent>,
    target_fps: u32,

    targets: OffscreenTargetManager,
    detector: EscapeDetector,
    cache: BoundedCache<String, Arc<[u8]>>,

    clock: FrameClock,
    fps: FpsMeter,

    warned: Warnings,
}

impl<G, E> PerformanceController<G, E>
where
    G: GraphicsApi,
    E: RenderEngine<G>,
{
    pub fn new(gfx: G, engine: E, hints: PlatformHints, config: ControllerConfig) -> Self {
        let detector = EscapeDetector::new(
            config.escape_threshold,
            config.clear_color,
            config.escape_fill_color,
        );
        let fps = FpsMeter::new(config.fps_window);
        let target_fps = config.clamp_fps(initial_fps(DeviceTier::Mid));

        Self {
            gfx,
            engine,
            hints,
            config,
            audio: None,
            session: None,
            display: None,
            mode: PerformanceMode::Direct,
            render_extent: Extent::default(),
            custom_resolution: None,
            target_fps,
            targets: OffscreenTargetManager::new(),
            detector,
            cache: BoundedCache::new(),
            clock: FrameClock::new(),
            fps,
            warned: Warnings::default(),
        }
    }

    pub fn with_audio_sink(mut self, sink: Arc<dyn AudioSink>) -> Self {
        self.audio = Some(sink);
        self
    }

    // ── accessors ──────────────────────────────────────────────────────────

    #[inline]
    pub fn gfx(&self) -> &G {
        &self.gfx
    }

    #[inline]
    pub fn gfx_mut(&mut self) -> &mut G {
        &mut self.gfx
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[inline]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[inline]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Sink for the capture thread to feed directly.
    pub fn audio_sink(&self) -> Option<Arc<dyn AudioSink>> {
        self.audio.clone()
    }

    #[inline]
    pub fn display(&self) -> Option<Extent> {
        self.display
    }

    /// `None` until the first surface has been created.
    pub fn device_tier(&self) -> Option<DeviceTier> {
        self.session.as_ref().map(|s| s.profile.tier)
    }

    pub fn device_profile(&self) -> Option<DeviceProfile> {
        self.session.as_ref().map(|s| s.profile)
    }

    pub fn capabilities(&self) -> Option<Capabilities> {
        self.session.as_ref().map(|s| s.compositor.capabilities())
    }

    pub fn state(&self) -> PerformanceState {
        PerformanceState {
            mode: self.mode,
            escape_count: self.detector.escape_count(),
            render_width: self.render_extent.width,
            render_height: self.render_extent.height,
            target_fps: self.target_fps,
            blit_faulted: self
                .session
                .as_ref()
                .is_some_and(|s| s.compositor.blit_faulted()),
        }
    }

    #[inline]
    pub fn is_performance_mode_enabled(&self) -> bool {
        self.mode.is_performance()
    }

    /// Frame rate measured over the last completed window.
    #[inline]
    pub fn current_fps(&self) -> f32 {
        self.fps.current()
    }

    /// `true` while an offscreen target is allocated.
    #[inline]
    pub fn has_render_target(&self) -> bool {
        self.targets.exists()
    }

    /// Lifetime (created, destroyed) offscreen target counts.
    pub fn target_counts(&self) -> (u64, u64) {
        (self.targets.creations(), self.targets.destructions())
    }

    // ── surface lifecycle ──────────────────────────────────────────────────

    /// The platform has a surface and a current context.
    ///
    /// The first call classifies the device and resolves capabilities; both
    /// stay fixed for the controller's lifetime.
    pub fn on_surface_created(&mut self, width: i32, height: i32, preset_path: &str) {
        let Some(display) = Extent::from_signed(width, height) else {
            log::warn!("surface created with unusable size {width}x{height}; ignored");
            return;
        };

        if self.session.is_none() {
            let profile = classify(&self.hints.device_model, self.hints.low_ram);
            let caps = self.gfx.capabilities();
            self.mode = default_mode(profile.tier);
            self.target_fps = self.config.clamp_fps(initial_fps(profile.tier));

            log::info!(
                "device {:?}: tier {}, high-end {}, low-memory {}, default mode {}",
                self.hints.device_model,
                profile.tier,
                profile.is_high_end,
                profile.is_low_memory,
                self.mode
            );
            log::info!(
                "capabilities: fast blit {}, invalidate {}, discard ext {}, max texture {}",
                caps.has_fast_blit,
                caps.has_invalidate_hint,
                caps.has_discard_ext_hint,
                caps.max_texture_size
            );

            self.session = Some(Session {
                governor: MemoryGovernor::new(&profile, self.config.trim_interval_frames),
                compositor: Compositor::new(caps),
                profile,
            });
        }

        // Re-creation without an intervening destroy.
        self.targets.destroy(&mut self.gfx);
        self.display = Some(display);
        self.clock.reset();
        self.fps.restart();

        self.enter_mode_resources(display);

        if let Err(err) = self.engine.init(&mut self.gfx, preset_path, self.render_extent) {
            log::error!("render engine init failed for {preset_path:?}: {err:#}");
        }
        self.notify_engine();

        log::info!(
            "surface {display}: mode {}, render {}",
            self.mode,
            self.render_extent
        );
    }

    /// The display size changed.
    pub fn on_surface_changed(&mut self, width: i32, height: i32) {
        if self.display.is_none() {
            self.warn_no_surface("on_surface_changed");
            return;
        }
        let Some(display) = Extent::from_signed(width, height) else {
            log::debug!("surface resized to {width}x{height}; waiting for a usable size");
            return;
        };
        if self.display == Some(display) {
            return;
        }

        log::debug!("display {display}");
        self.display = Some(display);
        self.custom_resolution = None;
        self.enter_mode_resources(display);
        self.notify_engine();
    }

    /// Runs one frame. Returns `None` when no frame could be produced.
    pub fn on_draw_frame(&mut self) -> Option<FrameReport> {
        let Some(display) = self.display else {
            self.warn_no_surface("on_draw_frame");
            return None;
        };

        let frame = self.clock.tick();
        if let Some(fps) = self.fps.record(frame.now) {
            log::debug!("{fps:.1} fps ({} render {})", self.mode, self.render_extent);
        }

        // The trim cadence counts ticks, including ticks that produce no frame.
        let trimmed = self.session.as_ref().and_then(|session| {
            session
                .governor
                .on_frame(frame.frame_index.wrapping_add(1), &mut self.cache)
        });

        if let Err(err) = self.gfx.begin_frame() {
            if self.warned.begin_frame.trip() {
                log::warn!("frame skipped: {err}");
            }
            return None;
        }

        let target = match self.mode {
            PerformanceMode::Performance => self.targets.current().copied(),
            PerformanceMode::Direct => None,
        };

        let mut report = FrameReport::direct();

        match (target, self.session.as_mut()) {
            (Some(target), Some(session)) => {
                report.mode = PerformanceMode::Performance;

                let engine = &mut self.engine;
                let warned = &mut self.warned.engine_render;
                let capture = self
                    .detector
                    .capture(&mut self.gfx, &target, |gfx| render_once(engine, gfx, warned));
                report.capture = Some(capture);
                report.present = Some(session.compositor.present(&mut self.gfx, &target, display));
            }
            _ => {
                self.gfx.bind_draw_target(DrawTarget::Default);
                self.gfx.set_viewport(display);
                self.gfx.clear(self.config.clear_color);
                render_once(&mut self.engine, &mut self.gfx, &mut self.warned.engine_render);
            }
        }

        if report.capture.is_some() && self.detector.threshold_reached() {
            log::warn!(
                "{} unrecovered escapes; falling back to direct rendering at {display}",
                self.detector.escape_count()
            );
            self.targets.destroy(&mut self.gfx);
            self.mode = PerformanceMode::Direct;
            self.render_extent = display;
            self.notify_engine();
            report.fell_back = true;
        }

        if let Err(err) = self.gfx.end_frame() {
            if self.warned.end_frame.trip() {
                log::warn!("frame submission failed: {err}");
            }
        }

        report.trimmed = trimmed;
        Some(report)
    }

    /// The surface is gone. Releases every GPU object the controller owns.
    ///
    /// Idempotent. Mode and session facts survive for the next surface.
    pub fn on_surface_destroyed(&mut self) {
        let released = self.targets.destroy(&mut self.gfx);
        if let Some(session) = self.session.as_mut() {
            session.compositor.release(&mut self.gfx);
        }
        if self.display.take().is_some() || released {
            log::debug!("surface released");
        }
    }

    /// Final teardown: GPU objects and the auxiliary cache. Idempotent.
    pub fn destroy(&mut self) {
        self.on_surface_destroyed();
        self.cache.clear();
    }

    // ── control surface ────────────────────────────────────────────────────

    pub fn set_performance_mode(&mut self, enabled: bool) {
        self.set_mode(PerformanceMode::from_enabled(enabled));
    }

    /// Switches mode. A request for the current mode does nothing.
    pub fn set_mode(&mut self, mode: PerformanceMode) {
        if self.session.is_none() {
            self.warn_no_surface("set_mode");
            return;
        }
        if mode == self.mode {
            return;
        }

        log::info!("mode {} -> {mode}", self.mode);
        self.mode = mode;
        self.detector.reset();

        if let Some(display) = self.display {
            self.enter_mode_resources(display);
            self.notify_engine();
        }
    }

    /// Requests a custom offscreen size. Only honoured in Performance mode.
    ///
    /// Requests larger than the device's texture limit are scaled down
    /// uniformly; the result is clamped to the display.
    pub fn set_render_resolution(&mut self, width: i32, height: i32) {
        let Some(display) = self.display else {
            self.warn_no_surface("set_render_resolution");
            return;
        };
        if !self.mode.is_performance() {
            if self.warned.resolution_in_direct.trip() {
                log::info!("render resolution {width}x{height} ignored in direct mode");
            }
            return;
        }
        let Some(requested) = Extent::from_signed(width, height) else {
            log::warn!("render resolution {width}x{height} ignored");
            return;
        };

        let max_side = self.capabilities().map_or(0, |caps| caps.max_texture_size);
        let fitted = requested.scaled_to_max_side(max_side);
        if fitted != requested {
            log::warn!("render resolution {requested} exceeds texture limit {max_side}; using {fitted}");
        }
        let extent = fitted.clamped_to(display);

        self.custom_resolution = Some(extent);
        if extent == self.render_extent && self.targets.exists() {
            return;
        }
        self.enter_mode_resources(display);
        self.notify_engine();
    }

    /// Stores a frame-rate target clamped to the configured bounds.
    pub fn set_target_fps(&mut self, fps: u32) {
        let clamped = self.config.clamp_fps(fps);
        if clamped != fps && self.warned.fps_clamped.trip() {
            log::info!("target fps {fps} clamped to {clamped}");
        }
        self.target_fps = clamped;
    }

    /// Trims the auxiliary cache now. Returns the evicted count.
    pub fn trim_memory(&mut self) -> usize {
        if self.session.is_none() {
            self.warn_no_surface("trim_memory");
            return 0;
        }
        self.session
            .as_ref()
            .map_or(0, |session| session.governor.trim_now(&mut self.cache))
    }

    /// Stores an auxiliary asset (decoded texture data, preset text, ...).
    pub fn cache_asset(&mut self, key: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.cache.insert(key.into(), bytes.into());
    }

    pub fn cached_asset(&self, key: &str) -> Option<Arc<[u8]>> {
        self.cache.get(key).cloned()
    }

    pub fn cached_asset_count(&self) -> usize {
        self.cache.len()
    }

    /// Forwards PCM to the attached sink. Never blocks on the render thread.
    pub fn add_pcm(&self, samples: &[i16]) {
        if let Some(sink) = &self.audio {
            sink.add_pcm(samples);
        }
    }

    // ── internals ──────────────────────────────────────────────────────────

    fn performance_extent(&self, display: Extent) -> Extent {
        let tier = self
            .session
            .as_ref()
            .map_or(DeviceTier::Mid, |s| s.profile.tier);
        let base = self.custom_resolution.unwrap_or_else(|| {
            compute_render_resolution(
                &self.config.resolution_table,
                tier,
                PerformanceMode::Performance,
                display,
            )
        });
        base.clamped_to(display)
    }

    /// Brings the render size and offscreen target in line with the current
    /// mode. A target that cannot be built forces Direct.
    fn enter_mode_resources(&mut self, display: Extent) {
        match self.mode {
            PerformanceMode::Direct => {
                self.targets.destroy(&mut self.gfx);
                self.render_extent = display;
            }
            PerformanceMode::Performance => {
                let extent = self.performance_extent(display);
                match self.targets.resize(&mut self.gfx, extent) {
                    Ok(_) => self.render_extent = extent,
                    Err(err) => {
                        log::error!("offscreen target {extent} unavailable ({err}); using direct rendering");
                        self.mode = PerformanceMode::Direct;
                        self.render_extent = display;
                    }
                }
            }
        }
    }

    fn notify_engine(&mut self) {
        let size = self.engine.set_window_size(self.render_extent);
        let respect = self
            .engine
            .set_respect_external_framebuffer(self.mode.is_performance());
        if let Err(err) = size.and(respect) {
            if self.warned.engine_hint.trip() {
                log::warn!("render engine rejected a hint: {err:#}");
            }
        }
    }

    fn warn_no_surface(&mut self, call: &str) {
        if self.warned.no_surface.trip() {
            log::warn!("{call} before surface creation; ignored");
        }
    }
}

fn render_once<G, E>(engine: &mut E, gfx: &mut G, warned: &mut Latch)
where
    G: GraphicsApi,
    E: RenderEngine<G>,
{
    if let Err(err) = engine.render(gfx) {
        if warned.trip() {
            log::warn!("render engine failed: {err:#}");
        }
    }
}
