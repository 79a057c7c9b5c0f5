use crate::compositor::PresentOutcome;
use crate::coords::Extent;
use crate::escape::FrameCapture;
use crate::policy::PerformanceMode;

/// Snapshot of the controller's mode state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PerformanceState {
    pub mode: PerformanceMode,
    /// Unrecovered escapes since the last explicit mode change.
    pub escape_count: u32,
    pub render_width: u32,
    pub render_height: u32,
    /// Stored frame-rate target. Advisory; nothing here paces frames.
    pub target_fps: u32,
    /// A hardware blit has failed at least once this session.
    pub blit_faulted: bool,
}

impl PerformanceState {
    #[inline]
    pub fn render_extent(&self) -> Extent {
        Extent::new(self.render_width, self.render_height)
    }
}

/// What one `on_draw_frame` call did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Mode the frame was rendered in.
    pub mode: PerformanceMode,
    /// Offscreen capture result; `None` for direct frames.
    pub capture: Option<FrameCapture>,
    /// Compositing strategy; `None` for direct frames.
    pub present: Option<PresentOutcome>,
    /// This frame crossed the escape threshold and switched to Direct.
    pub fell_back: bool,
    /// Entries evicted by a periodic trim on this frame.
    pub trimmed: Option<usize>,
}

impl FrameReport {
    pub(crate) fn direct() -> Self {
        Self {
            mode: PerformanceMode::Direct,
            capture: None,
            present: None,
            fell_back: false,
            trimmed: None,
        }
    }
}
