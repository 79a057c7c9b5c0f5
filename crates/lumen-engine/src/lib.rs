//! Lumen engine crate.
//!
//! Adaptive render-performance control for audio-reactive visualizers on
//! constrained GPUs: the controller core, the graphics seam it drives, a wgpu
//! backend for that seam and a desktop host runtime.

pub mod device;
pub mod window;
pub mod time;

pub mod logging;
pub mod coords;

pub mod gfx;
pub mod profile;
pub mod policy;
pub mod target;
pub mod compositor;
pub mod escape;
pub mod memory;
pub mod engine;
pub mod config;
pub mod controller;

mod latch;

pub use config::ControllerConfig;
pub use controller::{FrameReport, PerformanceController, PerformanceState};
pub use engine::{AudioSink, RenderEngine};
pub use policy::PerformanceMode;
pub use profile::{DeviceTier, PlatformHints};
