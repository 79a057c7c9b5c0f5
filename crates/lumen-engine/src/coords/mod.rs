//! Pixel sizes and colors shared by the controller and its backends.
//!
//! All sizes are physical pixels. Render targets and the display surface are
//! described by [`Extent`]; nothing in the controller works in logical units.

mod color;
mod extent;

pub use color::Rgba;
pub use extent::Extent;
