#![allow(dead_code)]

use glam::Vec3;
use manylights_gpu_shared::clustering::ClusterView;
use manylights_render::camera::Camera;
use manylights_render::clusters::ClusterSnapshot;
use manylights_render::context::GpuContext;
use manylights_render::scene::{Scene, SceneLayouts};
use manylights_render::{RendererConfig, Stage};

pub const CANVAS: u32 = 256;

/// Headless context, or `None` (with a note on stderr) when the machine has
/// no usable adapter.
pub fn create_gpu(test: &str) -> Option<GpuContext> {
    let _ = env_logger::builder().is_test(true).try_init();
    match GpuContext::headless(CANVAS, CANVAS) {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("Skipping {test} (no GPU): {e}");
            None
        }
    }
}

/// Camera at the origin looking down -Z, so view space equals world space.
pub fn origin_camera() -> Camera {
    Camera::looking_at(Vec3::ZERO, Vec3::NEG_Z, 1.0)
}

pub fn create_stage(test: &str, config: RendererConfig) -> Option<Stage> {
    let gpu = create_gpu(test)?;
    let layouts = SceneLayouts::new(&gpu.device);
    Some(Stage::new(gpu, layouts, Scene::empty(), origin_camera(), config).expect("stage"))
}

pub fn cluster_view(stage: &Stage) -> ClusterView {
    ClusterView::from_uniforms(&stage.camera.uniforms())
}

/// Runs one cluster build on its own submission and reads the result back.
pub fn build_and_read(stage: &Stage) -> ClusterSnapshot {
    let device = &stage.gpu.device;
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    stage.clusters.build_clusters(&mut encoder);
    stage.gpu.queue.submit(Some(encoder.finish()));
    stage
        .clusters
        .read_clusters(device, &stage.gpu.queue)
        .expect("cluster readback")
}
