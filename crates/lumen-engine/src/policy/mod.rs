//! Render-resolution policy.
//!
//! Pure functions: given a tier, a mode and the display size, pick the size the
//! render engine draws at. The compositor handles any scale-up.

mod resolution;

pub use resolution::{compute_render_resolution, default_mode, PerformanceMode, ResolutionTable};
