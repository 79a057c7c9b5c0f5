//! Device classification.
//!
//! A device is sorted into a coarse [`DeviceTier`] from platform hints (model
//! string, low-RAM flag). The result drives the default render resolution,
//! the default performance mode, the initial frame-rate target and the cache
//! budget. Classification happens once per controller and is never revised.

mod classify;

pub use classify::{classify, DeviceProfile, DeviceTier, PlatformHints};
