use std::fmt;

/// Coarse device capability class.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DeviceTier {
    Low,
    Mid,
    High,
}

impl DeviceTier {
    /// Stable numeric code for host bridges (0 = Low, 1 = Mid, 2 = High).
    pub const fn code(self) -> i32 {
        match self {
            DeviceTier::Low => 0,
            DeviceTier::Mid => 1,
            DeviceTier::High => 2,
        }
    }
}

impl fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceTier::Low => "low",
            DeviceTier::Mid => "mid",
            DeviceTier::High => "high",
        };
        f.write_str(s)
    }
}

/// Platform facts available before the first surface exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformHints {
    /// Device model identifier as reported by the platform.
    pub device_model: String,
    /// Platform reports a low-RAM device.
    pub low_ram: bool,
}

impl PlatformHints {
    pub fn new(device_model: impl Into<String>, low_ram: bool) -> Self {
        Self {
            device_model: device_model.into(),
            low_ram,
        }
    }
}

/// Outcome of [`classify`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub tier: DeviceTier,
    /// Model matched a known high-end identifier.
    pub is_high_end: bool,
    /// Device is memory constrained; enables periodic cache trimming.
    pub is_low_memory: bool,
}

/// Streaming boxes known to sustain full-resolution rendering.
const HIGH_END_MODELS: &[&str] = &[
    "shield",
    "tegra",
    "chromecast ultra",
    "mi box s",
    "fire tv stick 4k",
    "fire tv cube",
    "apple tv 4k",
];

/// Sticks and boxes with weak GPUs or little memory.
const CONSTRAINED_MODELS: &[&str] = &[
    "fire tv stick lite",
    "fire tv stick (2nd gen)",
    "fire tv stick (3rd gen)",
    "chromecast hd",
    "mi tv stick",
    "mibox3",
    "mi box 3",
    "x96",
    "h96",
    "tx3 mini",
];

/// Classifies a device from its model string and the platform's low-RAM hint.
///
/// Matching is case-insensitive and by substring. Constrained identifiers are
/// checked first so that e.g. "Fire TV Stick Lite" does not fall through to a
/// broader high-end entry. Unmatched models are Mid. A low-RAM hint forces Low
/// regardless of the model and never upgrades a tier.
pub fn classify(device_model: &str, low_ram: bool) -> DeviceProfile {
    let model = device_model.to_lowercase();

    let constrained = CONSTRAINED_MODELS.iter().any(|m| model.contains(m));
    let is_high_end = !constrained && HIGH_END_MODELS.iter().any(|m| model.contains(m));

    let mut tier = if constrained {
        DeviceTier::Low
    } else if is_high_end {
        DeviceTier::High
    } else {
        DeviceTier::Mid
    };

    if low_ram {
        tier = DeviceTier::Low;
    }

    DeviceProfile {
        tier,
        is_high_end,
        is_low_memory: low_ram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_high_end_models() {
        for model in ["NVIDIA SHIELD Android TV", "Chromecast Ultra", "MI BOX S", "AFTMM Fire TV Stick 4K"] {
            let p = classify(model, false);
            assert_eq!(p.tier, DeviceTier::High, "{model}");
            assert!(p.is_high_end, "{model}");
            assert!(!p.is_low_memory);
        }
    }

    #[test]
    fn known_constrained_models() {
        for model in ["Fire TV Stick Lite", "Chromecast HD", "X96 Max"] {
            let p = classify(model, false);
            assert_eq!(p.tier, DeviceTier::Low, "{model}");
            assert!(!p.is_high_end, "{model}");
        }
    }

    #[test]
    fn unmatched_defaults_to_mid() {
        let p = classify("Generic Android TV Box", false);
        assert_eq!(p.tier, DeviceTier::Mid);
        assert!(!p.is_high_end);
        assert!(!p.is_low_memory);
    }

    #[test]
    fn empty_model_defaults_to_mid() {
        assert_eq!(classify("", false).tier, DeviceTier::Mid);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("sHiElD", false).tier, DeviceTier::High);
    }

    #[test]
    fn low_ram_forces_low_even_on_high_end() {
        let p = classify("NVIDIA SHIELD", true);
        assert_eq!(p.tier, DeviceTier::Low);
        assert!(p.is_high_end);
        assert!(p.is_low_memory);
    }

    #[test]
    fn low_ram_sets_flag_on_unmatched() {
        let p = classify("Some Box", true);
        assert_eq!(p.tier, DeviceTier::Low);
        assert!(p.is_low_memory);
    }

    #[test]
    fn classification_is_deterministic() {
        assert_eq!(classify("Mi Box S", false), classify("Mi Box S", false));
    }

    #[test]
    fn tier_codes_are_stable() {
        assert_eq!(DeviceTier::Low.code(), 0);
        assert_eq!(DeviceTier::Mid.code(), 1);
        assert_eq!(DeviceTier::High.code(), 2);
    }
}
