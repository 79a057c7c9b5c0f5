/// Optional GPU features, resolved once after the context exists.
///
/// Injected into the compositor instead of probing entry points per call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Hardware scaled framebuffer blit is available.
    pub has_fast_blit: bool,
    /// Core framebuffer invalidation is available.
    pub has_invalidate_hint: bool,
    /// Vendor discard extension is available.
    pub has_discard_ext_hint: bool,
    /// Largest texture side the device accepts; `0` when unknown.
    pub max_texture_size: u32,
}

impl Capabilities {
    /// Baseline every backend can honour: quad fallback only, no hints.
    pub const fn minimal() -> Self {
        Self {
            has_fast_blit: false,
            has_invalidate_hint: false,
            has_discard_ext_hint: false,
            max_texture_size: 0,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::minimal()
    }
}
