//! Forward+ strategy: cluster build, then one geometry pass shading each
//! fragment with its cluster's lights.

use crate::error::RenderResult;
use crate::passes::forward::render_forward_pass;
use crate::pipeline;
use crate::render_targets::{create_depth_target, DepthTarget};
use crate::stage::Stage;
use crate::strategy::{RenderMode, RenderStrategy};

use super::create_clustered_scene_bind_group;

pub struct ForwardPlusRenderer {
    pipeline: wgpu::RenderPipeline,
    scene_bgl: wgpu::BindGroupLayout,
    scene_bg: wgpu::BindGroup,
    depth: DepthTarget,
    generation: u64,
}

impl ForwardPlusRenderer {
    pub fn new(stage: &Stage) -> Self {
        let device = &stage.gpu.device;
        log::info!("Creating Forward+ pipeline...");
        let scene_bgl = pipeline::create_clustered_scene_bgl(device);
        let pipeline = pipeline::create_forward_plus_pipeline(
            device,
            &stage.config.cluster,
            &scene_bgl,
            &stage.layouts.model,
            &stage.layouts.material,
            stage.gpu.format,
        );
        let scene_bg = create_clustered_scene_bind_group(stage, &scene_bgl, "Forward+ Scene BG");
        let depth = create_depth_target(device, stage.width(), stage.height(), "Forward+ Depth");

        Self {
            pipeline,
            scene_bgl,
            scene_bg,
            depth,
            generation: stage.generation(),
        }
    }

    fn refresh(&mut self, stage: &Stage) {
        if self.generation != stage.generation() {
            self.scene_bg =
                create_clustered_scene_bind_group(stage, &self.scene_bgl, "Forward+ Scene BG");
            self.generation = stage.generation();
        }
        if !self.depth.matches(stage.width(), stage.height()) {
            self.depth = create_depth_target(
                &stage.gpu.device,
                stage.width(),
                stage.height(),
                "Forward+ Depth",
            );
        }
    }
}

impl RenderStrategy<Stage> for ForwardPlusRenderer {
    fn mode(&self) -> RenderMode {
        RenderMode::ForwardPlus
    }

    fn draw(&mut self, stage: &mut Stage) -> RenderResult<()> {
        stage.debug_check_grid();
        self.refresh(stage);
        let target = stage.target()?;

        let mut encoder = stage
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Forward+ Encoder"),
            });
        stage.clusters.build_clusters(&mut encoder);
        render_forward_pass(
            &mut encoder,
            "Forward+ Pass",
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
