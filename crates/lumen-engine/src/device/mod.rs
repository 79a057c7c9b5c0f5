//! wgpu backend for the graphics seam.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue and the display surface
//! - implementing [`GraphicsApi`](crate::gfx::GraphicsApi) on top of them
//! - the textured-quad program used to composite offscreen targets
//! - handing the bound target's encoder and view to a render engine

mod backend;
mod errors;
mod init;
mod present;
mod surface;

pub use backend::{DrawContext, WgpuGraphics};
pub use init::WgpuInit;
pub use surface::SurfaceErrorAction;
