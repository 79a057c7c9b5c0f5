//! Graphics seam.
//!
//! The controller never talks to a GPU API directly. It drives a
//! [`GraphicsApi`], a small bind-based surface covering exactly what offscreen
//! rendering, compositing and escape detection need. The wgpu implementation
//! lives in [`crate::device`].

mod api;
mod caps;
mod error;

#[cfg(test)]
pub(crate) mod fake;

pub use api::{
    DrawTarget, FramebufferHandle, GraphicsApi, InvalidateHint, ProgramHandle, TextureHandle,
};
pub use caps::Capabilities;
pub use error::{FramebufferStatus, GfxError};
