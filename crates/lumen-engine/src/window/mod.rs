//! Desktop host.
//!
//! Owns the `winit` EventLoop and Window, creates the wgpu backend for it and
//! translates window events into the controller's surface lifecycle.

mod runtime;

pub use runtime::{AudioInput, Host, HostConfig, HostedEngine};
pub use winit::keyboard::KeyCode;
