use thiserror::Error;

use crate::coords::Extent;

/// Framebuffer completeness as reported by the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    IncompleteAttachment,
    MissingAttachment,
    Unsupported,
}

/// Failures surfaced by a [`GraphicsApi`](super::GraphicsApi) backend.
#[derive(Debug, Error)]
pub enum GfxError {
    #[error("failed to allocate {extent} color texture: {reason}")]
    TextureAllocation { extent: Extent, reason: String },

    #[error("failed to allocate framebuffer: {0}")]
    FramebufferAllocation(String),

    #[error("framebuffer incomplete: {0:?}")]
    FramebufferIncomplete(FramebufferStatus),

    #[error("present program failed to build: {0}")]
    ProgramBuild(String),

    #[error("scaled blit failed: {0}")]
    Blit(String),

    #[error("textured quad draw failed: {0}")]
    Draw(String),

    #[error("no frame available this tick")]
    FrameUnavailable,

    #[error("graphics device lost")]
    DeviceLost,

    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    #[error("unknown {0} handle")]
    UnknownHandle(&'static str),
}
