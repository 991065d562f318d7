//! Naive forward strategy: one geometry pass, every light per fragment.

use crate::error::RenderResult;
use crate::passes::forward::render_forward_pass;
use crate::pipeline;
use crate::render_targets::{create_depth_target, DepthTarget};
use crate::stage::Stage;
use crate::strategy::{RenderMode, RenderStrategy};

pub struct NaiveRenderer {
    pipeline: wgpu::RenderPipeline,
    scene_bg: wgpu::BindGroup,
    depth: DepthTarget,
}

impl NaiveRenderer {
    pub fn new(stage: &Stage) -> Self {
        let device = &stage.gpu.device;
        log::info!("Creating naive pipeline...");
        let scene_bgl = pipeline::create_naive_scene_bgl(device);
        let pipeline = pipeline::create_naive_pipeline(
            device,
            &stage.config.cluster,
            &scene_bgl,
            &stage.layouts.model,
            &stage.layouts.material,
            stage.gpu.format,
        );

        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Naive Scene BG"),
            layout: &scene_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: stage.camera_buffer.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: stage.lights.light_set_buffer.as_entire_binding(),
                },
            ],
        });

        let depth = create_depth_target(device, stage.width(), stage.height(), "Naive Depth");
        Self {
            pipeline,
            scene_bg,
            depth,
        }
    }
}

impl RenderStrategy<Stage> for NaiveRenderer {
    fn mode(&self) -> RenderMode {
        RenderMode::Naive
    }

    fn draw(&mut self, stage: &mut Stage) -> RenderResult<()> {
        let target = stage.target()?;
        if !self.depth.matches(stage.width(), stage.height()) {
            self.depth = create_depth_target(&stage.gpu.device, stage.width(), stage.height(), "Naive Depth");
        }

        let mut encoder = stage
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Naive Encoder"),
            });
        render_forward_pass(
            &mut encoder,
            "Naive Pass",
            target,
            &self.depth.view,
            &self.pipeline,
            &self.scene_bg,
            &stage.scene,
        );
        stage.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
