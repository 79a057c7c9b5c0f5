/// One-way boolean: starts clear, can be tripped, never resets.
///
/// Used for "degrade and never retry" decisions (a faulted blit path) and for
/// diagnostics that must be logged once per session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Latch {
    tripped: bool,
}

impl Latch {
    #[inline]
    pub const fn new() -> Self {
        Self { tripped: false }
    }

    /// Trips the latch. Returns `true` only for the call that performed the
    /// transition, so callers can gate a one-shot log on it.
    #[inline]
    pub fn trip(&mut self) -> bool {
        let first = !self.tripped;
        self.tripped = true;
        first
    }

    #[inline]
    pub const fn is_tripped(self) -> bool {
        self.tripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear() {
        assert!(!Latch::new().is_tripped());
    }

    #[test]
    fn trip_reports_first_transition_only() {
        let mut l = Latch::new();
        assert!(l.trip());
        assert!(!l.trip());
        assert!(!l.trip());
        assert!(l.is_tripped());
    }
}
