//! Auxiliary cache bounding.
//!
//! - [`BoundedCache`]: insertion-ordered map, trimmed oldest-first.
//! - [`MemoryGovernor`]: tier-keyed cap plus the periodic trim cadence.

mod cache;
mod governor;

pub use cache::BoundedCache;
pub use governor::{tier_cap, MemoryGovernor};
