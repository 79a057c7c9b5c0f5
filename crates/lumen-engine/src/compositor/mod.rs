//! Upscaling of the offscreen target onto the display.
//!
//! Two strategies, chosen per frame:
//! - hardware scaled blit, when the device has one and it has never faulted;
//! - a full-screen textured quad drawn with a passthrough program.
//!
//! A blit fault is sticky for the lifetime of the [`Compositor`].

mod present;

pub use present::{Compositor, PresentOutcome};
