//! Frame timing.
//!
//! - one [`FrameClock`] per controller, ticked once per `on_draw_frame`
//! - one [`FpsMeter`] per controller, fed after each presented frame

mod fps;
mod frame_clock;

pub use fps::FpsMeter;
pub use frame_clock::{FrameClock, FrameTime};
