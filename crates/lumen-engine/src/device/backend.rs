use std::collections::HashMap;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::{Extent, Rgba};
use crate::gfx::{
    Capabilities, DrawTarget, FramebufferHandle, FramebufferStatus, GfxError, GraphicsApi,
    InvalidateHint, ProgramHandle, TextureHandle,
};

use super::errors::ErrorSlot;
use super::present::PresentProgram;
use super::surface::{self, SurfaceErrorAction};
use super::WgpuInit;

/// A single acquired display frame.
///
/// Holding the surface texture blocks acquisition of the next one; it is
/// submitted and presented in [`GraphicsApi::end_frame`].
struct FrameRecording {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

struct OffscreenTexture {
    // Kept alive for the view; dropped rather than destroyed so that commands
    // already recorded this frame stay valid.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    extent: Extent,
}

/// Color texture behind a framebuffer handle.
///
/// Takes the maps rather than `&self` so callers can hold the frame encoder
/// mutably at the same time.
fn offscreen<'a, T>(
    framebuffers: &HashMap<FramebufferHandle, TextureHandle>,
    textures: &'a HashMap<TextureHandle, T>,
    framebuffer: FramebufferHandle,
) -> Option<&'a T> {
    framebuffers.get(&framebuffer).and_then(|t| textures.get(t))
}

/// What a render engine needs to record draws into the bound target.
pub struct DrawContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// View of the currently bound draw target.
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    /// Current viewport in physical pixels.
    pub viewport: Extent,
}

/// [`GraphicsApi`] on top of wgpu.
///
/// wgpu has no framebuffer objects or global bind state. Both are modelled
/// here: a framebuffer is a handle naming its color texture, and the bound
/// draw target is plain state that render passes resolve when they are
/// recorded. Every operation is recorded into the frame's single encoder.
pub struct WgpuGraphics<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    caps: Capabilities,
    errors: ErrorSlot,

    next_id: u32,
    textures: HashMap<TextureHandle, OffscreenTexture>,
    framebuffers: HashMap<FramebufferHandle, TextureHandle>,
    programs: HashMap<ProgramHandle, PresentProgram>,

    bound: DrawTarget,
    viewport: Extent,
    frame: Option<FrameRecording>,
}

impl<'w> WgpuGraphics<'w> {
    /// Creates a context bound to `window`.
    pub async fn new(window: &'w Window, init: WgpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let WgpuInit {
            prefer_srgb,
            present_mode,
            alpha_mode,
            power_preference,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let errors = ErrorSlot::install(&device);

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&surface_caps, prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&surface_caps, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        // Scaled blits have no wgpu counterpart (copies are 1:1), so the quad
        // path is the only present strategy. Store-discard passes provide the
        // core invalidation hint.
        let caps = Capabilities {
            has_fast_blit: false,
            has_invalidate_hint: true,
            has_discard_ext_hint: false,
            max_texture_size: device.limits().max_texture_dimension_2d,
        };

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            caps,
            errors,
            next_id: 0,
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            programs: HashMap::new(),
            bound: DrawTarget::Default,
            viewport: Extent::new(size.width, size.height),
            frame: None,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface. A zero size is recorded but not applied.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Encoder and view of the bound target, while a frame is being recorded.
    pub fn draw_context(&mut self) -> Option<DrawContext<'_>> {
        let frame = self.frame.as_mut()?;
        let view = match self.bound {
            DrawTarget::Default => &frame.view,
            DrawTarget::Offscreen(fb) => &offscreen(&self.framebuffers, &self.textures, fb)?.view,
        };
        Some(DrawContext {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut frame.encoder,
            view,
            format: self.config.format,
            viewport: self.viewport,
        })
    }

    fn next_raw(&mut self) -> u32 {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }

    /// Records an empty pass on the bound target with the given ops.
    fn record_pass(&mut self, label: &str, load: wgpu::LoadOp<wgpu::Color>, store: wgpu::StoreOp) {
        let Some(frame) = self.frame.as_mut() else {
            log::trace!("{label} outside a frame; ignored");
            return;
        };
        let view = match self.bound {
            DrawTarget::Default => &frame.view,
            DrawTarget::Offscreen(fb) => {
                let Some(target) = offscreen(&self.framebuffers, &self.textures, fb) else {
                    return;
                };
                &target.view
            }
        };
        let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations { load, store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}

impl GraphicsApi for WgpuGraphics<'_> {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn begin_frame(&mut self) -> Result<(), GfxError> {
        if self.frame.take().is_some() {
            log::warn!("previous frame was never ended; dropped");
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                let action = surface::map_surface_error(
                    &self.surface,
                    &self.device,
                    &self.config,
                    self.size,
                    &err,
                );
                log::debug!("surface acquire failed: {err} ({action:?})");
                return Err(match action {
                    SurfaceErrorAction::Fatal => GfxError::DeviceLost,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        GfxError::FrameUnavailable
                    }
                });
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen frame encoder"),
            });

        self.bound = DrawTarget::Default;
        self.viewport = Extent::new(self.config.width, self.config.height);
        self.frame = Some(FrameRecording {
            surface_texture,
            view,
            encoder,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GfxError> {
        let frame = self.frame.take().ok_or(GfxError::FrameUnavailable)?;
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        frame.surface_texture.present();

        match self.errors.take() {
            Some(message) => Err(GfxError::Draw(message)),
            None => Ok(()),
        }
    }

    fn create_texture(&mut self, extent: Extent) -> Result<TextureHandle, GfxError> {
        let max = self.caps.max_texture_size;
        if extent.is_empty() || extent.width > max || extent.height > max {
            return Err(GfxError::TextureAllocation {
                extent,
                reason: format!("outside 1..={max}"),
            });
        }

        self.errors.take();
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen offscreen color"),
            size: wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        if let Some(reason) = self.errors.take() {
            return Err(GfxError::TextureAllocation { extent, reason });
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let handle = TextureHandle::from_raw(self.next_raw()).ok_or(GfxError::UnknownHandle("texture"))?;
        self.textures.insert(
            handle,
            OffscreenTexture {
                _texture: texture,
                view,
                extent,
            },
        );
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_none() {
            log::debug!("delete of unknown texture {}", texture.raw());
        }
    }

    fn create_framebuffer(&mut self, color: TextureHandle) -> Result<FramebufferHandle, GfxError> {
        if !self.textures.contains_key(&color) {
            return Err(GfxError::FramebufferAllocation(format!(
                "color texture {} does not exist",
                color.raw()
            )));
        }
        let handle =
            FramebufferHandle::from_raw(self.next_raw()).ok_or(GfxError::UnknownHandle("framebuffer"))?;
        self.framebuffers.insert(handle, color);
        Ok(handle)
    }

    fn framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        let Some(texture) = self.framebuffers.get(&framebuffer) else {
            return FramebufferStatus::MissingAttachment;
        };
        match self.textures.get(texture) {
            Some(t) if !t.extent.is_empty() => FramebufferStatus::Complete,
            Some(_) => FramebufferStatus::IncompleteAttachment,
            None => FramebufferStatus::MissingAttachment,
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if self.framebuffers.remove(&framebuffer).is_none() {
            log::debug!("delete of unknown framebuffer {}", framebuffer.raw());
        }
        if self.bound == DrawTarget::Offscreen(framebuffer) {
            self.bound = DrawTarget::Default;
        }
    }

    fn bind_draw_target(&mut self, target: DrawTarget) {
        self.bound = target;
    }

    fn bound_draw_target(&self) -> DrawTarget {
        self.bound
    }

    fn set_viewport(&mut self, extent: Extent) {
        self.viewport = extent;
    }

    fn clear(&mut self, color: Rgba) {
        self.record_pass("lumen clear", wgpu::LoadOp::Clear(color.to_wgpu()), wgpu::StoreOp::Store);
    }

    fn reset_fragment_state(&mut self) {
        // Depth, stencil, blend and cull are baked into each pipeline and
        // scissor is per pass; there is no global state to reset.
    }

    fn blit_scaled(
        &mut self,
        _src: FramebufferHandle,
        _src_extent: Extent,
        _dst: DrawTarget,
        _dst_extent: Extent,
    ) -> Result<(), GfxError> {
        Err(GfxError::Unsupported("scaled blit"))
    }

    fn build_present_program(&mut self) -> Result<ProgramHandle, GfxError> {
        self.errors.take();
        let program = PresentProgram::new(&self.device, self.config.format);
        if let Some(message) = self.errors.take() {
            return Err(GfxError::ProgramBuild(message));
        }

        let handle = ProgramHandle::from_raw(self.next_raw()).ok_or(GfxError::UnknownHandle("program"))?;
        self.programs.insert(handle, program);
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_none() {
            log::debug!("delete of unknown program {}", program.raw());
        }
    }

    fn draw_textured_quad(
        &mut self,
        program: ProgramHandle,
        texture: TextureHandle,
        viewport: Extent,
    ) -> Result<(), GfxError> {
        let program = self.programs.get(&program).ok_or(GfxError::UnknownHandle("program"))?;
        let source = self.textures.get(&texture).ok_or(GfxError::UnknownHandle("texture"))?;
        let frame = self.frame.as_mut().ok_or(GfxError::FrameUnavailable)?;

        let (view, bounds) = match self.bound {
            DrawTarget::Default => (&frame.view, Extent::new(self.config.width, self.config.height)),
            DrawTarget::Offscreen(fb) => {
                let target = offscreen(&self.framebuffers, &self.textures, fb)
                    .ok_or(GfxError::UnknownHandle("framebuffer"))?;
                (&target.view, target.extent)
            }
        };

        let area = viewport.clamped_to(bounds);
        if area.is_empty() {
            return Ok(());
        }

        let bind_group = program.bind_group(&self.device, &source.view);

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen present pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(0.0, 0.0, area.width as f32, area.height as f32, 0.0, 1.0);
        rpass.set_pipeline(&program.pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_vertex_buffer(0, program.vertices.slice(..));
        rpass.draw(0..4, 0..1);
        Ok(())
    }

    fn invalidate_color(&mut self, framebuffer: FramebufferHandle, _hint: InvalidateHint) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let Some(view) = offscreen(&self.framebuffers, &self.textures, framebuffer).map(|t| &t.view)
        else {
            return;
        };

        let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen invalidate"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Discard,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fb(raw: u32) -> FramebufferHandle {
        FramebufferHandle::from_raw(raw).unwrap()
    }

    fn tex(raw: u32) -> TextureHandle {
        TextureHandle::from_raw(raw).unwrap()
    }

    #[test]
    fn framebuffer_resolves_to_its_color_texture() {
        let framebuffers = HashMap::from([(fb(2), tex(1)), (fb(4), tex(3))]);
        let textures = HashMap::from([(tex(1), Extent::new(854, 480)), (tex(3), Extent::new(1280, 720))]);

        assert_eq!(offscreen(&framebuffers, &textures, fb(2)), Some(&Extent::new(854, 480)));
        assert_eq!(offscreen(&framebuffers, &textures, fb(4)), Some(&Extent::new(1280, 720)));
    }

    #[test]
    fn dangling_or_unknown_framebuffer_resolves_to_none() {
        let framebuffers = HashMap::from([(fb(2), tex(1))]);
        let textures: HashMap<TextureHandle, Extent> = HashMap::new();

        // texture already dropped
        assert_eq!(offscreen(&framebuffers, &textures, fb(2)), None);
        assert_eq!(offscreen(&framebuffers, &textures, fb(9)), None);
    }
}
