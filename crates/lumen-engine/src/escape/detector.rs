use std::fmt;

use crate::coords::Rgba;
use crate::gfx::{DrawTarget, GraphicsApi};
use crate::latch::Latch;
use crate::target::RenderTarget;

/// How the frame's content ended up in the offscreen target.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameCapture {
    /// The engine honoured the binding on the first attempt.
    Nominal,
    /// The first attempt escaped, the retry stayed on target.
    Recovered,
    /// Both attempts escaped; the target holds the fill pattern.
    Lost,
}

impl fmt::Display for FrameCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameCapture::Nominal => "nominal",
            FrameCapture::Recovered => "recovered",
            FrameCapture::Lost => "lost",
        })
    }
}

#[derive(Debug)]
pub struct EscapeDetector {
    threshold: u32,
    escape_count: u32,
    clear_color: Rgba,
    fill_color: Rgba,

    // log-once
    warned_escape: Latch,
    warned_lost: Latch,
}

impl EscapeDetector {
    pub fn new(threshold: u32, clear_color: Rgba, fill_color: Rgba) -> Self {
        Self {
            threshold,
            escape_count: 0,
            clear_color,
            fill_color,
            warned_escape: Latch::new(),
            warned_lost: Latch::new(),
        }
    }

    /// Unrecovered escapes since the last [`reset`](Self::reset).
    #[inline]
    pub fn escape_count(&self) -> u32 {
        self.escape_count
    }

    #[inline]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// `true` once the count has reached the threshold. A zero threshold
    /// never trips.
    pub fn threshold_reached(&self) -> bool {
        self.threshold > 0 && self.escape_count >= self.threshold
    }

    pub fn reset(&mut self) {
        self.escape_count = 0;
    }

    /// Renders one frame into `target` through `render`.
    ///
    /// At most two calls to `render` happen per invocation. `render` must not
    /// assume it starts on a fresh binding; it is called with `target` bound
    /// and cleared.
    pub fn capture<G, F>(&mut self, gfx: &mut G, target: &RenderTarget, mut render: F) -> FrameCapture
    where
        G: GraphicsApi + ?Sized,
        F: FnMut(&mut G),
    {
        let expected = DrawTarget::Offscreen(target.framebuffer);

        prepare(gfx, target, self.clear_color);
        render(gfx);
        if gfx.bound_draw_target() == expected {
            return FrameCapture::Nominal;
        }

        if self.warned_escape.trip() {
            log::warn!(
                "render engine rebound {:?} during an offscreen frame; retrying once per frame",
                gfx.bound_draw_target()
            );
        }

        prepare(gfx, target, self.clear_color);
        render(gfx);
        if gfx.bound_draw_target() == expected {
            return FrameCapture::Recovered;
        }

        prepare(gfx, target, self.fill_color);
        self.escape_count = self.escape_count.saturating_add(1);
        if self.warned_lost.trip() {
            log::warn!(
                "offscreen frame lost after retry; filling target (threshold {})",
                self.threshold
            );
        }
        FrameCapture::Lost
    }
}

fn prepare<G>(gfx: &mut G, target: &RenderTarget, color: Rgba)
where
    G: GraphicsApi + ?Sized,
{
    gfx.bind_draw_target(DrawTarget::Offscreen(target.framebuffer));
    gfx.set_viewport(target.extent);
    gfx.clear(color);
}
