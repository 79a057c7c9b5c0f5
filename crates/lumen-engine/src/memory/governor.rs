use std::hash::Hash;

use crate::profile::{DeviceProfile, DeviceTier};

use super::BoundedCache;

/// Maximum auxiliary cache entries per tier.
pub const fn tier_cap(tier: DeviceTier) -> usize {
    match tier {
        DeviceTier::High => 100,
        DeviceTier::Mid => 50,
        DeviceTier::Low => 20,
    }
}

/// Decides when the auxiliary cache gets trimmed, and to what size.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryGovernor {
    cap: usize,
    interval_frames: u64,
    constrained: bool,
}

impl MemoryGovernor {
    pub fn new(profile: &DeviceProfile, interval_frames: u64) -> Self {
        Self {
            cap: tier_cap(profile.tier),
            interval_frames,
            constrained: profile.is_low_memory,
        }
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Periodic trim. Runs on every `interval_frames`-th frame (1-based) and
    /// only on memory-constrained devices. Returns the evicted count when a
    /// trim ran.
    pub fn on_frame<K, V>(&self, frame_number: u64, cache: &mut BoundedCache<K, V>) -> Option<usize>
    where
        K: Eq + Hash + Clone,
    {
        if !self.constrained || self.interval_frames == 0 {
            return None;
        }
        if frame_number == 0 || frame_number % self.interval_frames != 0 {
            return None;
        }
        Some(self.trim_now(cache))
    }

    /// Trims regardless of cadence or memory pressure.
    pub fn trim_now<K, V>(&self, cache: &mut BoundedCache<K, V>) -> usize
    where
        K: Eq + Hash + Clone,
    {
        let evicted = cache.trim(self.cap);
        if evicted > 0 {
            log::debug!("trimmed {evicted} cached entries (cap {})", self.cap);
        }
        evicted
    }
}
