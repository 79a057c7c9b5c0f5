use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use lumen_engine::coords::Extent;
use lumen_engine::device::WgpuGraphics;
use lumen_engine::gfx::{DrawTarget, GraphicsApi};
use lumen_engine::window::{HostedEngine, KeyCode};
use lumen_engine::RenderEngine;

use crate::audio::PcmLevel;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    time: f32,
    level: f32,
    hue: f32,
    _pad: f32,
}

struct Pipeline {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Demo visualizer: a full-viewport plasma driven by the audio level.
///
/// `E` toggles rogue mode, in which the engine rebinds the display target
/// before drawing the way a misbehaving third-party engine would.
pub struct PlasmaEngine {
    level: Arc<PcmLevel>,
    started: Instant,
    hue: f32,
    pipeline: Option<Pipeline>,
    window: Extent,
    respect_external: bool,
    rogue: bool,
}

impl PlasmaEngine {
    pub fn new(level: Arc<PcmLevel>) -> Self {
        Self {
            level,
            started: Instant::now(),
            hue: 0.0,
            pipeline: None,
            window: Extent::default(),
            respect_external: false,
            rogue: false,
        }
    }
}

/// Palette offset for a preset file. Unknown names get the default palette.
fn preset_hue(preset_path: &str) -> f32 {
    let stem = Path::new(preset_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match stem {
        "warm" => 0.0,
        "cool" => 3.1,
        "acid" => 1.6,
        _ => 4.4,
    }
}

fn build_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat) -> Pipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("plasma shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("plasma.wgsl").into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("plasma bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("plasma uniforms"),
        size: std::mem::size_of::<Uniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("plasma bind group"),
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniforms.as_entire_binding(),
        }],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("plasma pipeline layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("plasma pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    Pipeline {
        pipeline,
        uniforms,
        bind_group,
    }
}

impl<'w> RenderEngine<WgpuGraphics<'w>> for PlasmaEngine {
    fn init(&mut self, gfx: &mut WgpuGraphics<'w>, preset_path: &str, extent: Extent) -> Result<()> {
        self.hue = preset_hue(preset_path);
        self.window = extent;
        if self.pipeline.is_none() {
            self.pipeline = Some(build_pipeline(gfx.device(), gfx.surface_format()));
        }
        log::info!("plasma ready at {extent} (preset `{preset_path}`)");
        Ok(())
    }

    fn render(&mut self, gfx: &mut WgpuGraphics<'w>) -> Result<()> {
        if self.rogue {
            gfx.bind_draw_target(DrawTarget::Default);
        }

        let pipeline = self.pipeline.as_ref().context("plasma engine not initialized")?;
        let ctx = gfx.draw_context().context("no frame is being recorded")?;

        let uniforms = Uniforms {
            time: self.started.elapsed().as_secs_f32(),
            level: self.level.level(),
            hue: self.hue,
            _pad: 0.0,
        };
        ctx.queue
            .write_buffer(&pipeline.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let mut rpass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("plasma pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: ctx.view,
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

        let Extent { width, height } = ctx.viewport;
        rpass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        rpass.set_pipeline(&pipeline.pipeline);
        rpass.set_bind_group(0, &pipeline.bind_group, &[]);
        rpass.draw(0..3, 0..1);
        Ok(())
    }

    fn set_window_size(&mut self, extent: Extent) -> Result<()> {
        if self.window != extent {
            log::debug!("plasma window {extent}");
            self.window = extent;
        }
        Ok(())
    }

    fn set_respect_external_framebuffer(&mut self, enabled: bool) -> Result<()> {
        self.respect_external = enabled;
        Ok(())
    }
}

impl HostedEngine for PlasmaEngine {
    fn on_key(&mut self, key: KeyCode) {
        if key == KeyCode::KeyE {
            self.rogue = !self.rogue;
            log::info!(
                "rogue rendering {} (respect external target: {})",
                if self.rogue { "on" } else { "off" },
                self.respect_external
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_hue_uses_file_stem() {
        assert_eq!(preset_hue("/presets/cool.milk"), preset_hue("cool"));
        assert_ne!(preset_hue("warm.milk"), preset_hue("cool.milk"));
        assert_eq!(preset_hue(""), preset_hue("unknown.milk"));
    }

    #[test]
    fn uniforms_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
    }
}
