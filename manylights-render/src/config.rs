//! Renderer configuration.

use manylights_gpu_shared::clustering::ClusterConfig;
use manylights_gpu_shared::uniforms::MAX_LIGHTS;

use crate::error::{RenderError, RenderResult};
use crate::lights::validate_light_count;
use crate::strategy::RenderMode;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererConfig {
    /// Strategy installed at startup.
    pub mode: RenderMode,
    /// Live light count at startup.
    pub num_lights: u32,
    pub cluster: ClusterConfig,
    /// Seed of the light color distribution.
    pub light_seed: u64,
    pub near: f32,
    pub far: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::ForwardPlus,
            num_lights: 500,
            cluster: ClusterConfig::default(),
            light_seed: 0x5EED,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl RendererConfig {
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_num_lights(mut self, num_lights: u32) -> Self {
        self.num_lights = num_lights;
        self
    }

    pub fn with_cluster(mut self, cluster: ClusterConfig) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_light_seed(mut self, seed: u64) -> Self {
        self.light_seed = seed;
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn validate(&self) -> RenderResult<()> {
        validate_light_count(self.num_lights)?;
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(RenderError::Limits(format!(
                "clip planes must satisfy 0 < near < far (got {} / {})",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

/// Steps a live light count by `step`, clamped to `[1, MAX_LIGHTS]`.
pub fn step_light_count(current: u32, step: i64) -> u32 {
    (current as i64 + step).clamp(1, MAX_LIGHTS as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RendererConfig::default();
        assert_eq!(config.mode, RenderMode::ForwardPlus);
        assert_eq!(config.num_lights, 500);
        assert_eq!(config.cluster.tile_size, 64);
        assert_eq!(config.cluster.depth_slices, 24);
        assert_eq!(config.cluster.max_lights_per_cluster, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = RendererConfig::default()
            .with_mode(RenderMode::Naive)
            .with_num_lights(42)
            .with_cluster(ClusterConfig::default().with_tile_size(32))
            .with_light_seed(9)
            .with_clip_planes(0.5, 50.0);
        assert_eq!(config.mode, RenderMode::Naive);
        assert_eq!(config.num_lights, 42);
        assert_eq!(config.cluster.tile_size, 32);
        assert_eq!(config.light_seed, 9);
        assert_eq!((config.near, config.far), (0.5, 50.0));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(RendererConfig::default()
            .with_num_lights(MAX_LIGHTS + 1)
            .validate()
            .is_err());
        assert!(RendererConfig::default()
            .with_clip_planes(0.0, 10.0)
            .validate()
            .is_err());
        assert!(RendererConfig::default()
            .with_clip_planes(5.0, 1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_step_light_count_clamps() {
        assert_eq!(step_light_count(500, 100), 600);
        assert_eq!(step_light_count(50, -100), 1);
        assert_eq!(step_light_count(MAX_LIGHTS - 10, 100), MAX_LIGHTS);
    }

    #[test]
    fn test_cluster_builders_clamp_to_one() {
        let cluster = ClusterConfig::default()
            .with_tile_size(0)
            .with_depth_slices(0)
            .with_max_lights_per_cluster(0);
        assert_eq!(
            (cluster.tile_size, cluster.depth_slices, cluster.max_lights_per_cluster),
            (1, 1, 1)
        );
    }
}
