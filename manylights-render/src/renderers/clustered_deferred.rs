//! Clustered deferred strategy: cluster build, G-buffer pass, then a
//! full-screen resolve with the same cluster lookup and shading as Forward+.

use crate::error::RenderResult;
use crate::passes::gbuffer::render_gbuffer_pass;
use crate::passes::resolve::render_resolve_pass;
use crate::pipeline;
use crate::render_targets::{create_gbuffer, GBuffer};
use crate::stage::Stage;
use crate::strategy::{RenderMode, RenderStrategy};

use super::create_clustered_scene_bind_group;

pub struct ClusteredDeferredRenderer {
    gbuffer_pipeline: wgpu::RenderPipeline,
    resolve_pipeline: wgpu::RenderPipeline,
    camera_bg: wgpu::BindGroup,
    scene_bgl: wgpu::BindGroupLayout,
    scene_bg: wgpu::BindGroup,
    gbuffer_read_bgl: wgpu::BindGroupLayout,
    gbuffer_bg: wgpu::BindGroup,
    gbuffer: GBuffer,
    generation: u64,
}

fn create_gbuffer_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    gbuffer: &GBuffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("GBuffer Read BG"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&gbuffer.position_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&gbuffer.normal_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&gbuffer.albedo_view),
            },
        ],
    })
}

impl ClusteredDeferredRenderer {
    pub fn new(stage: &Stage) -> Self {
        let device = &stage.gpu.device;
        let config = &stage.config.cluster;

        log::info!("Creating G-Buffer pipeline...");
        let camera_bgl = pipeline::create_camera_bgl(device);
        let gbuffer_pipeline = pipeline::create_gbuffer_pipeline(
            device,
            config,
            &camera_bgl,
            &stage.layouts.model,
            &stage.layouts.material,
        );

        log::info!("Creating deferred resolve pipeline...");
        let scene_bgl = pipeline::create_clustered_scene_bgl(device);
        let gbuffer_read_bgl = pipeline::create_gbuffer_read_bgl(device);
        let resolve_pipeline = pipeline::create_resolve_pipeline(
            device,
            config,
            &scene_bgl,
            &gbuffer_read_bgl,
            stage.gpu.format,
        );

        let camera_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GBuffer Camera BG"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: stage.camera_buffer.buffer.as_entire_binding(),
            }],
        });
        let scene_bg = create_clustered_scene_bind_group(stage, &scene_bgl, "Resolve Scene BG");
        let gbuffer = create_gbuffer(device, stage.width(), stage.height());
        let gbuffer_bg = create_gbuffer_bind_group(device, &gbuffer_read_bgl, &gbuffer);

        Self {
            gbuffer_pipeline,
            resolve_pipeline,
            camera_bg,
            scene_bgl,
            scene_bg,
            gbuffer_read_bgl,
            gbuffer_bg,
            gbuffer,
            generation: stage.generation(),
        }
    }

    fn refresh(&mut self, stage: &Stage) {
        if self.generation != stage.generation() {
            self.scene_bg =
                create_clustered_scene_bind_group(stage, &self.scene_bgl, "Resolve Scene BG");
            self.generation = stage.generation();
        }
        if !self.gbuffer.matches(stage.width(), stage.height()) {
            let device = &stage.gpu.device;
            self.gbuffer = create_gbuffer(device, stage.width(), stage.height());
            self.gbuffer_bg = create_gbuffer_bind_group(device, &self.gbuffer_read_bgl, &self.gbuffer);
        }
    }
}

impl RenderStrategy<Stage> for ClusteredDeferredRenderer {
    fn mode(&self) -> RenderMode {
        RenderMode::ClusteredDeferred
    }

    fn draw(&mut self, stage: &mut Stage) -> RenderResult<()> {
        stage.debug_check_grid();
        self.refresh(stage);
        let target = stage.target()?;

        let mut encoder = stage
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clustered Deferred Encoder"),
            });
        stage.clusters.build_clusters(&mut encoder);
        render_gbuffer_pass(
            &mut encoder,
            &self.gbuffer,
            &self.gbuffer_pipeline,
            &self.camera_bg,
            &stage.scene,
        );
        render_resolve_pass(
            &mut encoder,
            target,
            &self.resolve_pipeline,
            &self.scene_bg,
            &self.gbuffer_bg,
        );
        stage.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
