use std::ops::RangeInclusive;
use std::time::Duration;

use crate::coords::Rgba;
use crate::policy::ResolutionTable;

/// Tunables of a [`PerformanceController`](crate::controller::PerformanceController).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Unrecovered escapes after which Performance mode is abandoned.
    /// `0` disables the automatic fallback.
    pub escape_threshold: u32,
    /// Frames between periodic cache trims on memory-constrained devices.
    pub trim_interval_frames: u64,
    pub resolution_table: ResolutionTable,
    /// Accepted range for [`set_target_fps`](crate::controller::PerformanceController::set_target_fps).
    pub fps_bounds: RangeInclusive<u32>,
    pub clear_color: Rgba,
    /// Fill written into the offscreen target when a frame's content is lost.
    pub escape_fill_color: Rgba,
    /// Averaging window of the measured frame rate.
    pub fps_window: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            escape_threshold: 120,
            trim_interval_frames: 600,
            resolution_table: ResolutionTable::default(),
            fps_bounds: 15..=120,
            clear_color: Rgba::black(),
            escape_fill_color: Rgba::debug_magenta(),
            fps_window: Duration::from_secs(2),
        }
    }
}

impl ControllerConfig {
    /// Clamps `fps` into [`fps_bounds`](Self::fps_bounds).
    pub fn clamp_fps(&self, fps: u32) -> u32 {
        let lo = *self.fps_bounds.start();
        let hi = (*self.fps_bounds.end()).max(lo);
        fps.clamp(lo, hi)
    }
}
