//! Offscreen render-target lifecycle.
//!
//! A [`RenderTarget`] is a framebuffer plus its color texture. The
//! [`OffscreenTargetManager`] is its only owner: targets are built and torn
//! down as a unit, so a caller never sees one handle without the other.

mod manager;

pub use manager::{OffscreenTargetManager, RenderTarget};
