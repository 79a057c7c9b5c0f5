use std::num::NonZeroU32;

use crate::coords::{Extent, Rgba};

use super::{Capabilities, FramebufferStatus, GfxError};

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wraps a backend object id. Zero is reserved and rejected.
            #[inline]
            pub fn from_raw(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            #[inline]
            pub fn raw(self) -> u32 {
                self.0.get()
            }
        }
    };
}

gpu_handle!(
    /// Color texture owned by the backend.
    TextureHandle
);
gpu_handle!(
    /// Framebuffer object with a single color attachment.
    FramebufferHandle
);
gpu_handle!(
    /// Linked position + UV passthrough program used by the quad fallback.
    ProgramHandle
);

/// The target subsequent draws land in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DrawTarget {
    /// The display's own framebuffer.
    Default,
    /// A framebuffer created through [`GraphicsApi::create_framebuffer`].
    Offscreen(FramebufferHandle),
}

/// Flavour of attachment invalidation to issue after a present.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InvalidateHint {
    /// Core entry point (`glInvalidateFramebuffer`-style).
    Core,
    /// Vendor extension (`glDiscardFramebufferEXT`-style).
    DiscardExt,
}

/// Immediate-mode graphics seam the controller drives.
///
/// The contract mirrors a bind-based API: there is one current draw target,
/// and any party holding the context (including an opaque render engine) may
/// rebind it. [`bound_draw_target`](Self::bound_draw_target) must report the
/// actual current binding, which is what escape detection relies on.
///
/// Every method is called from the thread that owns the context.
pub trait GraphicsApi {
    /// Optional entry points and limits. Stable for the lifetime of the context.
    fn capabilities(&self) -> Capabilities;

    /// Starts recording a frame for the display.
    fn begin_frame(&mut self) -> Result<(), GfxError>;

    /// Submits and presents the frame started by [`begin_frame`](Self::begin_frame).
    fn end_frame(&mut self) -> Result<(), GfxError>;

    /// Allocates a color texture usable both as attachment and as sampled source.
    fn create_texture(&mut self, extent: Extent) -> Result<TextureHandle, GfxError>;

    fn delete_texture(&mut self, texture: TextureHandle);

    /// Allocates a framebuffer with `color` as its only color attachment.
    fn create_framebuffer(&mut self, color: TextureHandle) -> Result<FramebufferHandle, GfxError>;

    fn framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus;

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);

    fn bind_draw_target(&mut self, target: DrawTarget);

    /// The binding currently in effect, whoever set it.
    fn bound_draw_target(&self) -> DrawTarget;

    fn set_viewport(&mut self, extent: Extent);

    /// Clears the bound target's color to `color`.
    fn clear(&mut self, color: Rgba);

    /// Disables depth, stencil, scissor, blend and culling.
    fn reset_fragment_state(&mut self);

    /// Scaled, filtered copy from `src` (full `src_extent`) onto the whole of
    /// `dst` (`dst_extent`).
    fn blit_scaled(
        &mut self,
        src: FramebufferHandle,
        src_extent: Extent,
        dst: DrawTarget,
        dst_extent: Extent,
    ) -> Result<(), GfxError>;

    /// Builds the full-screen textured-quad program.
    fn build_present_program(&mut self) -> Result<ProgramHandle, GfxError>;

    fn delete_program(&mut self, program: ProgramHandle);

    /// Draws `texture` as a two-triangle strip covering `viewport` of the bound target.
    fn draw_textured_quad(
        &mut self,
        program: ProgramHandle,
        texture: TextureHandle,
        viewport: Extent,
    ) -> Result<(), GfxError>;

    /// Tells the driver the color contents of `framebuffer` are no longer needed.
    fn invalidate_color(&mut self, framebuffer: FramebufferHandle, hint: InvalidateHint);
}
