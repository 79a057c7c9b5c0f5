use std::fmt;

use crate::coords::Extent;
use crate::gfx::{Capabilities, DrawTarget, GraphicsApi, InvalidateHint, ProgramHandle};
use crate::latch::Latch;
use crate::target::RenderTarget;

/// Which strategy put the frame on the display.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PresentOutcome {
    Blit,
    Quad,
    /// Nothing was drawn: the quad program is unavailable or the draw failed.
    Skipped,
}

impl fmt::Display for PresentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PresentOutcome::Blit => "blit",
            PresentOutcome::Quad => "quad",
            PresentOutcome::Skipped => "skipped",
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum QuadProgram {
    Unbuilt,
    Ready(ProgramHandle),
    Failed,
}

#[derive(Debug)]
pub struct Compositor {
    caps: Capabilities,
    program: QuadProgram,

    blit_faulted: Latch,

    // log-once
    warned_program: Latch,
    warned_draw: Latch,
    announced_hint: Latch,
}

impl Compositor {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            program: QuadProgram::Unbuilt,
            blit_faulted: Latch::new(),
            warned_program: Latch::new(),
            warned_draw: Latch::new(),
            announced_hint: Latch::new(),
        }
    }

    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// `true` once a hardware blit has failed. Never clears.
    #[inline]
    pub fn blit_faulted(&self) -> bool {
        self.blit_faulted.is_tripped()
    }

    /// `true` when the quad program could not be built on this context.
    pub fn program_failed(&self) -> bool {
        self.program == QuadProgram::Failed
    }

    /// Draws `target` scaled to fill `display` on the default target.
    pub fn present<G>(&mut self, gfx: &mut G, target: &RenderTarget, display: Extent) -> PresentOutcome
    where
        G: GraphicsApi + ?Sized,
    {
        let fast = self.caps.has_fast_blit && !self.blit_faulted.is_tripped();
        if !fast && self.program == QuadProgram::Failed {
            return PresentOutcome::Skipped;
        }

        gfx.bind_draw_target(DrawTarget::Default);
        gfx.set_viewport(display);
        gfx.reset_fragment_state();

        let outcome = if fast {
            match gfx.blit_scaled(target.framebuffer, target.extent, DrawTarget::Default, display) {
                Ok(()) => PresentOutcome::Blit,
                Err(err) => {
                    if self.blit_faulted.trip() {
                        log::warn!("scaled blit failed ({err}); using textured quad from now on");
                    }
                    self.present_quad(gfx, target, display)
                }
            }
        } else {
            self.present_quad(gfx, target, display)
        };

        if outcome != PresentOutcome::Skipped {
            self.invalidate(gfx, target);
        }
        outcome
    }

    /// Deletes the quad program. Safe to call repeatedly.
    ///
    /// A later [`present`](Self::present) rebuilds it, which is what a new
    /// context after surface loss needs.
    pub fn release<G>(&mut self, gfx: &mut G)
    where
        G: GraphicsApi + ?Sized,
    {
        if let QuadProgram::Ready(program) = self.program {
            gfx.delete_program(program);
        }
        self.program = QuadProgram::Unbuilt;
    }

    fn present_quad<G>(&mut self, gfx: &mut G, target: &RenderTarget, display: Extent) -> PresentOutcome
    where
        G: GraphicsApi + ?Sized,
    {
        let Some(program) = self.ensure_program(gfx) else {
            return PresentOutcome::Skipped;
        };

        match gfx.draw_textured_quad(program, target.color_texture, display) {
            Ok(()) => PresentOutcome::Quad,
            Err(err) => {
                if self.warned_draw.trip() {
                    log::warn!("textured quad present failed: {err}");
                }
                PresentOutcome::Skipped
            }
        }
    }

    fn ensure_program<G>(&mut self, gfx: &mut G) -> Option<ProgramHandle>
    where
        G: GraphicsApi + ?Sized,
    {
        match self.program {
            QuadProgram::Ready(program) => Some(program),
            QuadProgram::Failed => None,
            QuadProgram::Unbuilt => match gfx.build_present_program() {
                Ok(program) => {
                    self.program = QuadProgram::Ready(program);
                    Some(program)
                }
                Err(err) => {
                    self.program = QuadProgram::Failed;
                    if self.warned_program.trip() {
                        log::error!("present program unavailable, frames will not be shown: {err}");
                    }
                    None
                }
            },
        }
    }

    fn invalidate<G>(&mut self, gfx: &mut G, target: &RenderTarget)
    where
        G: GraphicsApi + ?Sized,
    {
        let hint = if self.caps.has_invalidate_hint {
            InvalidateHint::Core
        } else if self.caps.has_discard_ext_hint {
            InvalidateHint::DiscardExt
        } else {
            return;
        };

        if self.announced_hint.trip() {
            log::debug!("invalidating offscreen color after present ({hint:?})");
        }
        gfx.invalidate_color(target.framebuffer, hint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::fake::{FakeGraphics, Op};
    use crate::target::OffscreenTargetManager;

    const DISPLAY: Extent = Extent::new(1920, 1080);

    fn setup(gfx: &mut FakeGraphics) -> RenderTarget {
        let mut mgr = OffscreenTargetManager::new();
        let target = mgr.create(gfx, Extent::new(854, 480)).unwrap();
        gfx.take_ops();
        target
    }

    fn count(ops: &[Op], pred: impl Fn(&Op) -> bool) -> usize {
        ops.iter().filter(|op| pred(*op)).count()
    }

    #[test]
    fn fast_path_blits_after_resetting_state() {
        let mut gfx = FakeGraphics::full();
        let target = setup(&mut gfx);
        let mut comp = Compositor::new(gfx.caps);

        assert_eq!(comp.present(&mut gfx, &target, DISPLAY), PresentOutcome::Blit);

        let ops = gfx.take_ops();
        let reset = ops.iter().position(|op| *op == Op::ResetFragmentState).unwrap();
        let blit = ops.iter().position(|op| matches!(op, Op::Blit { .. })).unwrap();
        assert!(reset < blit);
        assert_eq!(
            ops[blit],
            Op::Blit {
                src: target.framebuffer,
                dst: DrawTarget::Default,
                src_extent: target.extent,
                dst_extent: DISPLAY,
            }
        );
        assert_eq!(gfx.stats.programs_built, 0);
    }

    #[test]
    fn without_blit_draws_quad_and_builds_program_once() {
        let mut gfx = FakeGraphics::minimal();
        let target = setup(&mut gfx);
        let mut comp = Compositor::new(gfx.caps);

        assert_eq!(comp.present(&mut gfx, &target, DISPLAY), PresentOutcome::Quad);
        assert_eq!(comp.present(&mut gfx, &target, DISPLAY), PresentOutcome::Quad);

        assert_eq!(gfx.stats.programs_built, 1);
        assert_eq!(gfx.stats.blit_attempts, 0);
        let ops = gfx.take_ops();
        assert_eq!(
            count(&ops, |op| *op
                == Op::Quad {
                    texture: target.color_texture,
                    target: DrawTarget::Default,
                    viewport: DISPLAY,
                }),
            2
        );
    }

    #[test]
    fn blit_fault_falls_back_in_same_frame_and_never_retries() {
        let mut gfx = FakeGraphics::full();
        let target = setup(&mut gfx);
        let mut comp = Compositor::new(gfx.caps);

        gfx.faults.fail_blit = true;
        assert_eq!(comp.present(&mut gfx, &target, DISPLAY), PresentOutcome::Quad);
        assert!(comp.blit_faulted());

        // Blit would succeed now; the fault is sticky regardless.
        gfx.faults.fail_blit = false;
        for _ in 0..5 {
            assert_eq!(comp.present(&mut gfx, &target, DISPLAY), PresentOutcome::Quad);
        }
        assert_eq!(gfx.stats.blit_attempts, 1);
        assert!(comp.blit_faulted());
    }

    #[test]
    fn failed_program_skips_present_without_rebuilding() {
        let mut gfx = FakeGraphics::minimal();
        let target = setup(&mut gfx);
        let mut comp = Compositor::new(gfx.caps);

        gfx.faults.fail_program = true;
        assert_eq!(comp.present(&mut gfx, &target, DISPLAY), PresentOutcome::Skipped);
        assert!(comp.program_failed());

        let ops = gfx.take_ops();
        assert_eq!(count(&ops, |op| matches!(op, Op::Quad { .. })), 0);
        assert_eq!(count(&ops, |op| matches!(op, Op::Invalidate { .. })), 0);

        gfx.faults.fail_program = false;
        assert_eq!(comp.present(&mut gfx, &target, DISPLAY), PresentOutcome::Skipped);
        assert_eq!(gfx.stats.programs_built, 0);
        // Known-failed program: nothing bound, no viewport, no state reset.
        assert!(gfx.take_ops().is_empty());
    }

    // ── invalidation hint ────────────────────────────────────────────────

    #[test]
    fn invalidates_with_core_hint_after_present() {
        let mut gfx = FakeGraphics::full();
        let target = setup(&mut gfx);
        let mut comp = Compositor::new(gfx.caps);

        comp.present(&mut gfx, &target, DISPLAY);
        let ops = gfx.take_ops();
        assert_eq!(
            ops.last(),
            Some(&Op::Invalidate {
                framebuffer: target.framebuffer,
                hint: InvalidateHint::Core,
            })
        );
    }

    #[test]
    fn uses_discard_extension_when_core_missing() {
        let mut gfx = FakeGraphics::minimal();
        gfx.caps.has_discard_ext_hint = true;
        let target = setup(&mut gfx);
        let mut comp = Compositor::new(gfx.caps);

        comp.present(&mut gfx, &target, DISPLAY);
        let ops = gfx.take_ops();
        assert!(ops.contains(&Op::Invalidate {
            framebuffer: target.framebuffer,
            hint: InvalidateHint::DiscardExt,
        }));
    }

    #[test]
    fn no_hint_without_capability() {
        let mut gfx = FakeGraphics::minimal();
        let target = setup(&mut gfx);
        let mut comp = Compositor::new(gfx.caps);

        comp.present(&mut gfx, &target, DISPLAY);
        let ops = gfx.take_ops();
        assert_eq!(count(&ops, |op| matches!(op, Op::Invalidate { .. })), 0);
    }

    // ── release ──────────────────────────────────────────────────────────

    #[test]
    fn release_deletes_program_once() {
        let mut gfx = FakeGraphics::minimal();
        let target = setup(&mut gfx);
        let mut comp = Compositor::new(gfx.caps);
        comp.present(&mut gfx, &target, DISPLAY);

        comp.release(&mut gfx);
        comp.release(&mut gfx);
        assert_eq!(gfx.stats.programs_deleted, 1);
        assert_eq!(gfx.stats.double_releases, 0);

        // Next present rebuilds on the (new) context.
        assert_eq!(comp.present(&mut gfx, &target, DISPLAY), PresentOutcome::Quad);
        assert_eq!(gfx.stats.programs_built, 2);
    }
}
