//! The performance controller.
//!
//! One [`PerformanceController`] exists per active surface owner. It ties the
//! profiler, resolution policy, offscreen target, compositor, escape detector
//! and memory governor into the Direct/Performance state machine and exposes
//! the surface lifecycle plus the control surface to the host.

mod performance;
mod state;


pub use performance::PerformanceController;
pub use state::{FrameReport, PerformanceState};
