//! Escape detection.
//!
//! The render engine is handed an offscreen target but holds the whole
//! context, so nothing stops it from rebinding the display's default target
//! mid-frame. [`EscapeDetector`] runs the engine against the target, checks
//! the binding afterwards, retries once, and paints a fill pattern when the
//! frame is lost.

mod detector;

pub use detector::{EscapeDetector, FrameCapture};
