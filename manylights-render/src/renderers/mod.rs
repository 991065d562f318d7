//! Concrete rendering strategies over [`Stage`].

pub mod clustered_deferred;
pub mod forward_plus;
pub mod naive;

pub use clustered_deferred::ClusteredDeferredRenderer;
pub use forward_plus::ForwardPlusRenderer;
pub use naive::NaiveRenderer;

use crate::error::RenderResult;
use crate::stage::Stage;
use crate::strategy::{RenderMode, RenderStrategy};

/// Builds the strategy for `mode` against the stage's current resources.
pub fn create_renderer(mode: RenderMode, stage: &Stage) -> RenderResult<Box<dyn RenderStrategy<Stage>>> {
    Ok(match mode {
        RenderMode::Naive => Box::new(NaiveRenderer::new(stage)),
        RenderMode::ForwardPlus => Box::new(ForwardPlusRenderer::new(stage)),
        RenderMode::ClusteredDeferred => Box::new(ClusteredDeferredRenderer::new(stage)),
    })
}

/// Group 0 of the Forward+ fragment stage and the deferred resolve:
/// camera, light set, cluster set, grid, canvas.
pub(crate) fn create_clustered_scene_bind_group(
    stage: &Stage,
    layout: &wgpu::BindGroupLayout,
    label: &str,
) -> wgpu::BindGroup {
    stage.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: stage.camera_buffer.buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: stage.lights.light_set_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: stage.clusters.cluster_set_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: stage.clusters.grid_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: stage.clusters.canvas_buffer.as_entire_binding(),
            },
        ],
    })
}
