//! Everything a strategy draws from: device, scene, camera, lights and
//! clusters, plus the target view of the current frame.

use crate::camera::{Camera, CameraBuffer};
use crate::clusters::ClusterBuilder;
use crate::config::RendererConfig;
use crate::context::GpuContext;
use crate::error::{RenderError, RenderResult};
use crate::frame_loop::FrameTime;
use crate::lights::LightStore;
use crate::scene::{Scene, SceneLayouts};

pub struct Stage {
    pub gpu: GpuContext,
    pub config: RendererConfig,
    pub layouts: SceneLayouts,
    pub scene: Scene,
    pub camera: Camera,
    pub camera_buffer: CameraBuffer,
    pub lights: LightStore,
    pub clusters: ClusterBuilder,
    /// View to draw into; set by the front-end before each frame.
    pub target: Option<wgpu::TextureView>,
    /// Bumped whenever buffers that strategies bind are recreated.
    generation: u64,
}

impl Stage {
    pub fn new(
        gpu: GpuContext,
        layouts: SceneLayouts,
        scene: Scene,
        mut camera: Camera,
        config: RendererConfig,
    ) -> RenderResult<Self> {
        config.validate()?;
        camera.near = config.near;
        camera.far = config.far;
        camera.set_viewport(gpu.width, gpu.height);

        let camera_buffer = CameraBuffer::new(&gpu.device);
        camera_buffer.update(&gpu.queue, &camera);

        let lights = LightStore::new(
            &gpu.device,
            &gpu.queue,
            &config.cluster,
            config.num_lights,
            config.light_seed,
        )?;
        let clusters = ClusterBuilder::new(&gpu, &config.cluster, &lights, &camera_buffer)?;

        Ok(Self {
            gpu,
            config,
            layouts,
            scene,
            camera,
            camera_buffer,
            lights,
            clusters,
            target: None,
            generation: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.gpu.width
    }

    pub fn height(&self) -> u32 {
        self.gpu.height
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Per-frame update ahead of any draw: camera first, then the light
    /// animation submission.
    pub fn advance(&mut self, time: FrameTime) {
        self.camera.on_frame(time.delta as f32);
        self.camera_buffer.update(&self.gpu.queue, &self.camera);
        self.lights
            .animate(&self.gpu.device, &self.gpu.queue, time.time as f32);
    }

    pub fn set_light_count(&mut self, num_lights: u32) -> RenderResult<()> {
        self.lights.set_light_count(&self.gpu.queue, num_lights)
    }

    /// Adopts a new canvas size: camera aspect, cluster grid and everything
    /// bound to the old cluster buffers. On error the stage keeps its old size.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 || (width == self.width() && height == self.height()) {
            return Ok(());
        }
        let clusters = ClusterBuilder::for_canvas(
            &self.gpu,
            width,
            height,
            &self.config.cluster,
            &self.lights,
            &self.camera_buffer,
        )?;

        self.clusters = clusters;
        self.gpu.resize(width, height);
        self.camera.set_viewport(width, height);
        self.camera_buffer.update(&self.gpu.queue, &self.camera);
        self.generation += 1;
        log::info!("Stage resized to {}x{}", width, height);
        Ok(())
    }

    pub fn target(&self) -> RenderResult<&wgpu::TextureView> {
        self.target.as_ref().ok_or(RenderError::NoTarget)
    }

    /// The grid is sized once per canvas; drawing with a stale grid is a bug.
    pub fn debug_check_grid(&self) {
        debug_assert!(
            self.clusters
                .grid()
                .matches_canvas(self.gpu.width, self.gpu.height),
            "cluster grid {:?} does not match canvas {}x{}",
            self.clusters.grid(),
            self.gpu.width,
            self.gpu.height
        );
    }
}
