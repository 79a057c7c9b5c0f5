use std::fmt;

use crate::coords::Extent;
use crate::profile::DeviceTier;

/// How frames reach the display.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PerformanceMode {
    /// Engine renders into an offscreen target at reduced size; the compositor
    /// upscales it onto the display.
    Performance,
    /// Engine renders straight into the display's default target at full size.
    Direct,
}

impl PerformanceMode {
    #[inline]
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled {
            PerformanceMode::Performance
        } else {
            PerformanceMode::Direct
        }
    }

    #[inline]
    pub const fn is_performance(self) -> bool {
        matches!(self, PerformanceMode::Performance)
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceMode::Performance => f.write_str("performance"),
            PerformanceMode::Direct => f.write_str("direct"),
        }
    }
}

/// Fixed render sizes used in Performance mode, one per tier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResolutionTable {
    pub low: Extent,
    pub mid: Extent,
    pub high: Extent,
}

impl ResolutionTable {
    #[inline]
    pub const fn for_tier(&self, tier: DeviceTier) -> Extent {
        match tier {
            DeviceTier::Low => self.low,
            DeviceTier::Mid => self.mid,
            DeviceTier::High => self.high,
        }
    }
}

impl Default for ResolutionTable {
    fn default() -> Self {
        Self {
            low: Extent::new(854, 480),
            mid: Extent::new(1280, 720),
            high: Extent::new(1600, 900),
        }
    }
}

/// Render size for the given tier, mode and display.
///
/// Direct returns the display size unconditionally. Performance returns the
/// table entry for `tier` whatever the display size is; callers that need the
/// result to fit the display clamp it themselves.
pub fn compute_render_resolution(
    table: &ResolutionTable,
    tier: DeviceTier,
    mode: PerformanceMode,
    display: Extent,
) -> Extent {
    match mode {
        PerformanceMode::Direct => display,
        PerformanceMode::Performance => table.for_tier(tier),
    }
}

/// Mode selected at initialization before any explicit toggle.
///
/// High-tier devices start Direct; everything else starts in Performance.
pub const fn default_mode(tier: DeviceTier) -> PerformanceMode {
    match tier {
        DeviceTier::High => PerformanceMode::Direct,
        DeviceTier::Mid | DeviceTier::Low => PerformanceMode::Performance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [DeviceTier; 3] = [DeviceTier::Low, DeviceTier::Mid, DeviceTier::High];
    const DISPLAYS: [Extent; 5] = [
        Extent::new(1, 1),
        Extent::new(640, 480),
        Extent::new(1280, 720),
        Extent::new(1920, 1080),
        Extent::new(3840, 2160),
    ];

    #[test]
    fn direct_returns_display_for_every_tier() {
        let table = ResolutionTable::default();
        for tier in TIERS {
            for display in DISPLAYS {
                let r = compute_render_resolution(&table, tier, PerformanceMode::Direct, display);
                assert_eq!(r, display, "{tier} {display}");
            }
        }
    }

    #[test]
    fn performance_returns_table_independent_of_display() {
        let table = ResolutionTable::default();
        let expected = [
            (DeviceTier::Low, Extent::new(854, 480)),
            (DeviceTier::Mid, Extent::new(1280, 720)),
            (DeviceTier::High, Extent::new(1600, 900)),
        ];
        for (tier, want) in expected {
            for display in DISPLAYS {
                let r = compute_render_resolution(&table, tier, PerformanceMode::Performance, display);
                assert_eq!(r, want, "{tier} {display}");
            }
        }
    }

    #[test]
    fn high_tier_defaults_to_direct() {
        assert_eq!(default_mode(DeviceTier::High), PerformanceMode::Direct);
        assert_eq!(default_mode(DeviceTier::Mid), PerformanceMode::Performance);
        assert_eq!(default_mode(DeviceTier::Low), PerformanceMode::Performance);
    }

    #[test]
    fn from_enabled_maps_bool() {
        assert_eq!(PerformanceMode::from_enabled(true), PerformanceMode::Performance);
        assert_eq!(PerformanceMode::from_enabled(false), PerformanceMode::Direct);
    }
}
