use crate::coords::Extent;
use crate::gfx::{FramebufferHandle, FramebufferStatus, GfxError, GraphicsApi, TextureHandle};

/// A complete offscreen target.
///
/// Values of this type only exist for fully built targets; there is no
/// "half-valid" state to check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub extent: Extent,
    pub framebuffer: FramebufferHandle,
    pub color_texture: TextureHandle,
}

/// Owns at most one [`RenderTarget`].
#[derive(Debug, Default)]
pub struct OffscreenTargetManager {
    current: Option<RenderTarget>,
    creations: u64,
    destructions: u64,
}

impl OffscreenTargetManager {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> Option<&RenderTarget> {
        self.current.as_ref()
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.current.is_some()
    }

    /// Targets successfully built over the manager's lifetime.
    pub fn creations(&self) -> u64 {
        self.creations
    }

    /// Targets released over the manager's lifetime.
    pub fn destructions(&self) -> u64 {
        self.destructions
    }

    /// Builds a target of `extent`.
    ///
    /// Any existing target is released first. On failure every GPU object
    /// created during this call has been released again and no target exists.
    pub fn create<G>(&mut self, gfx: &mut G, extent: Extent) -> Result<RenderTarget, GfxError>
    where
        G: GraphicsApi + ?Sized,
    {
        self.destroy(gfx);

        if extent.is_empty() {
            return Err(GfxError::TextureAllocation {
                extent,
                reason: "zero-sized target".into(),
            });
        }

        let target = build(gfx, extent)?;
        self.current = Some(target);
        self.creations += 1;
        log::debug!(
            "offscreen target {extent} created (fbo {}, tex {})",
            target.framebuffer.raw(),
            target.color_texture.raw()
        );
        Ok(target)
    }

    /// Rebuilds the target at `extent`.
    ///
    /// Always destroy-then-create: attachment geometry must match exactly, so
    /// nothing is resized in place.
    pub fn resize<G>(&mut self, gfx: &mut G, extent: Extent) -> Result<RenderTarget, GfxError>
    where
        G: GraphicsApi + ?Sized,
    {
        self.destroy(gfx);
        self.create(gfx, extent)
    }

    /// Releases the current target, if any. Returns whether anything was released.
    ///
    /// Safe to call repeatedly.
    pub fn destroy<G>(&mut self, gfx: &mut G) -> bool
    where
        G: GraphicsApi + ?Sized,
    {
        let Some(target) = self.current.take() else {
            return false;
        };
        gfx.delete_framebuffer(target.framebuffer);
        gfx.delete_texture(target.color_texture);
        self.destructions += 1;
        log::debug!("offscreen target {} destroyed", target.extent);
        true
    }
}

fn build<G>(gfx: &mut G, extent: Extent) -> Result<RenderTarget, GfxError>
where
    G: GraphicsApi + ?Sized,
{
    let color_texture = gfx.create_texture(extent)?;

    let framebuffer = match gfx.create_framebuffer(color_texture) {
        Ok(fb) => fb,
        Err(err) => {
            gfx.delete_texture(color_texture);
            return Err(err);
        }
    };

    match gfx.framebuffer_status(framebuffer) {
        FramebufferStatus::Complete => Ok(RenderTarget {
            extent,
            framebuffer,
            color_texture,
        }),
        status => {
            gfx.delete_framebuffer(framebuffer);
            gfx.delete_texture(color_texture);
            Err(GfxError::FramebufferIncomplete(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::fake::FakeGraphics;

    const SIZE: Extent = Extent::new(854, 480);

    fn assert_nothing_live(gfx: &FakeGraphics) {
        assert_eq!(gfx.live_textures(), 0);
        assert_eq!(gfx.live_framebuffers(), 0);
        assert_eq!(gfx.stats.double_releases, 0);
    }

    #[test]
    fn create_builds_texture_and_framebuffer() {
        let mut gfx = FakeGraphics::minimal();
        let mut mgr = OffscreenTargetManager::new();

        let t = mgr.create(&mut gfx, SIZE).unwrap();
        assert_eq!(t.extent, SIZE);
        assert_eq!(gfx.texture_extent(t.color_texture), Some(SIZE));
        assert_eq!(gfx.live_textures(), 1);
        assert_eq!(gfx.live_framebuffers(), 1);
        assert_eq!(mgr.current(), Some(&t));
        assert_eq!(mgr.creations(), 1);
    }

    // ── fault injection: no half-built target ────────────────────────────

    #[test]
    fn texture_failure_leaves_nothing() {
        let mut gfx = FakeGraphics::minimal();
        gfx.faults.fail_texture = true;
        let mut mgr = OffscreenTargetManager::new();

        assert!(matches!(mgr.create(&mut gfx, SIZE), Err(GfxError::TextureAllocation { .. })));
        assert!(!mgr.exists());
        assert_nothing_live(&gfx);
    }

    #[test]
    fn framebuffer_failure_releases_texture() {
        let mut gfx = FakeGraphics::minimal();
        gfx.faults.fail_framebuffer = true;
        let mut mgr = OffscreenTargetManager::new();

        assert!(matches!(mgr.create(&mut gfx, SIZE), Err(GfxError::FramebufferAllocation(_))));
        assert!(!mgr.exists());
        assert_eq!(gfx.stats.textures_created, 1);
        assert_eq!(gfx.stats.textures_deleted, 1);
        assert_nothing_live(&gfx);
    }

    #[test]
    fn incomplete_framebuffer_releases_both() {
        let mut gfx = FakeGraphics::minimal();
        gfx.faults.incomplete_framebuffer = true;
        let mut mgr = OffscreenTargetManager::new();

        let err = mgr.create(&mut gfx, SIZE).unwrap_err();
        assert!(matches!(
            err,
            GfxError::FramebufferIncomplete(FramebufferStatus::IncompleteAttachment)
        ));
        assert!(!mgr.exists());
        assert_eq!(gfx.stats.framebuffers_created, 1);
        assert_eq!(gfx.stats.framebuffers_deleted, 1);
        assert_nothing_live(&gfx);
    }

    #[test]
    fn zero_extent_is_rejected_without_allocating() {
        let mut gfx = FakeGraphics::minimal();
        let mut mgr = OffscreenTargetManager::new();

        assert!(mgr.create(&mut gfx, Extent::new(0, 480)).is_err());
        assert_eq!(gfx.stats.textures_created, 0);
        assert_nothing_live(&gfx);
    }

    // ── destroy ──────────────────────────────────────────────────────────

    #[test]
    fn destroy_twice_is_a_no_op() {
        let mut gfx = FakeGraphics::minimal();
        let mut mgr = OffscreenTargetManager::new();
        mgr.create(&mut gfx, SIZE).unwrap();

        assert!(mgr.destroy(&mut gfx));
        assert!(!mgr.destroy(&mut gfx));
        assert_eq!(mgr.destructions(), 1);
        assert_nothing_live(&gfx);
    }

    #[test]
    fn destroy_without_target_is_a_no_op() {
        let mut gfx = FakeGraphics::minimal();
        let mut mgr = OffscreenTargetManager::new();

        assert!(!mgr.destroy(&mut gfx));
        assert_eq!(gfx.stats.framebuffers_deleted, 0);
        assert_eq!(gfx.stats.textures_deleted, 0);
        assert_nothing_live(&gfx);
    }

    // ── resize ───────────────────────────────────────────────────────────

    #[test]
    fn resize_replaces_target() {
        let mut gfx = FakeGraphics::minimal();
        let mut mgr = OffscreenTargetManager::new();
        let first = mgr.create(&mut gfx, SIZE).unwrap();

        let second = mgr.resize(&mut gfx, Extent::new(1280, 720)).unwrap();
        assert_ne!(first.framebuffer, second.framebuffer);
        assert_eq!(second.extent, Extent::new(1280, 720));
        assert_eq!(gfx.live_textures(), 1);
        assert_eq!(gfx.live_framebuffers(), 1);
        assert_eq!(gfx.stats.double_releases, 0);
    }

    #[test]
    fn failed_resize_leaves_no_target() {
        let mut gfx = FakeGraphics::minimal();
        let mut mgr = OffscreenTargetManager::new();
        mgr.create(&mut gfx, SIZE).unwrap();

        gfx.faults.fail_framebuffer = true;
        assert!(mgr.resize(&mut gfx, Extent::new(1280, 720)).is_err());
        assert!(!mgr.exists());
        assert_nothing_live(&gfx);
    }

    #[test]
    fn create_over_existing_target_releases_old_one() {
        let mut gfx = FakeGraphics::minimal();
        let mut mgr = OffscreenTargetManager::new();
        mgr.create(&mut gfx, SIZE).unwrap();
        mgr.create(&mut gfx, SIZE).unwrap();

        assert_eq!(gfx.live_textures(), 1);
        assert_eq!(gfx.live_framebuffers(), 1);
        assert_eq!(mgr.creations(), 2);
        assert_eq!(mgr.destructions(), 1);
    }
}
