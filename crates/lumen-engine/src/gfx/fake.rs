//! Recording, fault-injecting [`GraphicsApi`] for tests.

use std::collections::{BTreeMap, BTreeSet};

use crate::coords::{Extent, Rgba};

use super::{
    Capabilities, DrawTarget, FramebufferHandle, FramebufferStatus, GfxError, GraphicsApi,
    InvalidateHint, ProgramHandle, TextureHandle,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Op {
    BeginFrame,
    EndFrame,
    Bind(DrawTarget),
    Viewport(Extent),
    Clear { target: DrawTarget, color: Rgba },
    ResetFragmentState,
    Blit { src: FramebufferHandle, dst: DrawTarget, src_extent: Extent, dst_extent: Extent },
    Quad { texture: TextureHandle, target: DrawTarget, viewport: Extent },
    Invalidate { framebuffer: FramebufferHandle, hint: InvalidateHint },
}

/// Switches for injecting failures into individual entry points.
#[derive(Debug, Default, Clone)]
pub(crate) struct Faults {
    pub fail_texture: bool,
    pub fail_framebuffer: bool,
    pub incomplete_framebuffer: bool,
    pub fail_blit: bool,
    pub fail_program: bool,
    pub fail_begin_frame: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stats {
    pub textures_created: u32,
    pub textures_deleted: u32,
    pub framebuffers_created: u32,
    pub framebuffers_deleted: u32,
    pub programs_built: u32,
    pub programs_deleted: u32,
    pub blit_attempts: u32,
    /// Deletes of handles that were not live.
    pub double_releases: u32,
}

#[derive(Debug)]
pub(crate) struct FakeGraphics {
    pub caps: Capabilities,
    pub faults: Faults,
    pub stats: Stats,
    pub ops: Vec<Op>,
    next_id: u32,
    textures: BTreeMap<TextureHandle, Extent>,
    framebuffers: BTreeMap<FramebufferHandle, TextureHandle>,
    programs: BTreeSet<ProgramHandle>,
    bound: DrawTarget,
}

impl FakeGraphics {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            faults: Faults::default(),
            stats: Stats::default(),
            ops: Vec::new(),
            next_id: 0,
            textures: BTreeMap::new(),
            framebuffers: BTreeMap::new(),
            programs: BTreeSet::new(),
            bound: DrawTarget::Default,
        }
    }

    /// Quad fallback only.
    pub fn minimal() -> Self {
        Self::new(Capabilities::minimal())
    }

    /// Fast blit plus core invalidation.
    pub fn full() -> Self {
        Self::new(Capabilities {
            has_fast_blit: true,
            has_invalidate_hint: true,
            has_discard_ext_hint: false,
            max_texture_size: 4096,
        })
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn texture_extent(&self, texture: TextureHandle) -> Option<Extent> {
        self.textures.get(&texture).copied()
    }

    /// Sizes of all live textures, oldest handle first.
    pub fn live_texture_extents(&self) -> Vec<Extent> {
        self.textures.values().copied().collect()
    }

    pub fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    fn next_raw(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsApi for FakeGraphics {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn begin_frame(&mut self) -> Result<(), GfxError> {
        if self.faults.fail_begin_frame {
            return Err(GfxError::FrameUnavailable);
        }
        self.ops.push(Op::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GfxError> {
        self.ops.push(Op::EndFrame);
        Ok(())
    }

    fn create_texture(&mut self, extent: Extent) -> Result<TextureHandle, GfxError> {
        if self.faults.fail_texture {
            return Err(GfxError::TextureAllocation {
                extent,
                reason: "injected".into(),
            });
        }
        let raw = self.next_raw();
        let handle = TextureHandle::from_raw(raw).ok_or(GfxError::UnknownHandle("texture"))?;
        self.textures.insert(handle, extent);
        self.stats.textures_created += 1;
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_some() {
            self.stats.textures_deleted += 1;
        } else {
            self.stats.double_releases += 1;
        }
    }

    fn create_framebuffer(&mut self, color: TextureHandle) -> Result<FramebufferHandle, GfxError> {
        if self.faults.fail_framebuffer {
            return Err(GfxError::FramebufferAllocation("injected".into()));
        }
        if !self.textures.contains_key(&color) {
            return Err(GfxError::UnknownHandle("texture"));
        }
        let raw = self.next_raw();
        let handle = FramebufferHandle::from_raw(raw).ok_or(GfxError::UnknownHandle("framebuffer"))?;
        self.framebuffers.insert(handle, color);
        self.stats.framebuffers_created += 1;
        Ok(handle)
    }

    fn framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        if !self.framebuffers.contains_key(&framebuffer) {
            FramebufferStatus::MissingAttachment
        } else if self.faults.incomplete_framebuffer {
            FramebufferStatus::IncompleteAttachment
        } else {
            FramebufferStatus::Complete
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if self.framebuffers.remove(&framebuffer).is_some() {
            self.stats.framebuffers_deleted += 1;
        } else {
            self.stats.double_releases += 1;
        }
        if self.bound == DrawTarget::Offscreen(framebuffer) {
            self.bound = DrawTarget::Default;
        }
    }

    fn bind_draw_target(&mut self, target: DrawTarget) {
        self.bound = target;
        self.ops.push(Op::Bind(target));
    }

    fn bound_draw_target(&self) -> DrawTarget {
        self.bound
    }

    fn set_viewport(&mut self, extent: Extent) {
        self.ops.push(Op::Viewport(extent));
    }

    fn clear(&mut self, color: Rgba) {
        self.ops.push(Op::Clear {
            target: self.bound,
            color,
        });
    }

    fn reset_fragment_state(&mut self) {
        self.ops.push(Op::ResetFragmentState);
    }

    fn blit_scaled(
        &mut self,
        src: FramebufferHandle,
        src_extent: Extent,
        dst: DrawTarget,
        dst_extent: Extent,
    ) -> Result<(), GfxError> {
        self.stats.blit_attempts += 1;
        if self.faults.fail_blit {
            return Err(GfxError::Blit("injected".into()));
        }
        self.ops.push(Op::Blit {
            src,
            dst,
            src_extent,
            dst_extent,
        });
        Ok(())
    }

    fn build_present_program(&mut self) -> Result<ProgramHandle, GfxError> {
        if self.faults.fail_program {
            return Err(GfxError::ProgramBuild("injected".into()));
        }
        let raw = self.next_raw();
        let handle = ProgramHandle::from_raw(raw).ok_or(GfxError::UnknownHandle("program"))?;
        self.programs.insert(handle);
        self.stats.programs_built += 1;
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program) {
            self.stats.programs_deleted += 1;
        } else {
            self.stats.double_releases += 1;
        }
    }

    fn draw_textured_quad(
        &mut self,
        program: ProgramHandle,
        texture: TextureHandle,
        viewport: Extent,
    ) -> Result<(), GfxError> {
        if !self.programs.contains(&program) {
            return Err(GfxError::UnknownHandle("program"));
        }
        if !self.textures.contains_key(&texture) {
            return Err(GfxError::UnknownHandle("texture"));
        }
        self.ops.push(Op::Quad {
            texture,
            target: self.bound,
            viewport,
        });
        Ok(())
    }

    fn invalidate_color(&mut self, framebuffer: FramebufferHandle, hint: InvalidateHint) {
        self.ops.push(Op::Invalidate { framebuffer, hint });
    }
}
