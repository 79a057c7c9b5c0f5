use std::fmt;

/// Size of a surface or render target in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Builds an extent from signed platform dimensions.
    ///
    /// Returns `None` when either side is zero or negative.
    #[inline]
    pub fn from_signed(width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self::new(width as u32, height as u32))
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Per-axis minimum of `self` and `bound`.
    #[inline]
    pub fn clamped_to(self, bound: Extent) -> Self {
        Self::new(self.width.min(bound.width), self.height.min(bound.height))
    }

    /// Returns `true` when both sides fit inside `bound`.
    #[inline]
    pub const fn fits_within(self, bound: Extent) -> bool {
        self.width <= bound.width && self.height <= bound.height
    }

    /// Uniformly scales down so that neither side exceeds `max_side`.
    ///
    /// Aspect ratio is kept; sides never drop below 1.
    pub fn scaled_to_max_side(self, max_side: u32) -> Self {
        if max_side == 0 || (self.width <= max_side && self.height <= max_side) {
            return self;
        }
        let scale = (max_side as f64 / self.width as f64).min(max_side as f64 / self.height as f64);
        let w = ((self.width as f64 * scale).floor() as u32).clamp(1, max_side);
        let h = ((self.height as f64 * scale).floor() as u32).clamp(1, max_side);
        Self::new(w, h)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_signed_rejects_non_positive() {
        assert_eq!(Extent::from_signed(0, 720), None);
        assert_eq!(Extent::from_signed(1280, -1), None);
        assert_eq!(Extent::from_signed(1280, 720), Some(Extent::new(1280, 720)));
    }

    #[test]
    fn clamped_to_is_per_axis() {
        let e = Extent::new(1600, 900).clamped_to(Extent::new(1280, 1024));
        assert_eq!(e, Extent::new(1280, 900));
    }

    #[test]
    fn scaled_to_max_side_keeps_aspect() {
        let e = Extent::new(8192, 4096).scaled_to_max_side(4096);
        assert_eq!(e, Extent::new(4096, 2048));
    }

    #[test]
    fn scaled_to_max_side_leaves_small_sizes() {
        let e = Extent::new(1280, 720);
        assert_eq!(e.scaled_to_max_side(4096), e);
        assert_eq!(e.scaled_to_max_side(0), e);
    }

    #[test]
    fn display_format() {
        assert_eq!(Extent::new(854, 480).to_string(), "854x480");
    }
}
