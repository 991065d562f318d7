use clap::Parser;
use manylights_gpu_shared::uniforms::MAX_LIGHTS;
use manylights_render::{ClusterConfig, RenderMode, RendererConfig};

#[derive(Parser, Debug)]
#[command(
    name = "manylights",
    about = "Clustered many-light renderer (naive, Forward+ and clustered deferred)",
    version
)]
pub struct Args {
    /// Rendering strategy at startup: naive, forward-plus or clustered-deferred
    #[arg(short, long, default_value = "forward-plus")]
    pub mode: RenderMode,

    /// Number of live lights
    #[arg(
        short = 'n',
        long,
        default_value_t = 500,
        value_parser = clap::value_parser!(u32).range(0..=MAX_LIGHTS as i64)
    )]
    pub lights: u32,

    /// Initial window width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Cluster tile size in pixels
    #[arg(long, default_value_t = 64)]
    pub tile_size: u32,

    /// Number of logarithmic depth slices
    #[arg(long, default_value_t = 24)]
    pub slices: u32,

    /// Light indices stored per cluster before truncation
    #[arg(long, default_value_t = 500)]
    pub max_lights_per_cluster: u32,

    /// Seed of the light color distribution
    #[arg(long, default_value_t = 0x5EED)]
    pub seed: u64,
}

impl Args {
    pub fn renderer_config(&self) -> RendererConfig {
        let cluster = ClusterConfig::default()
            .with_tile_size(self.tile_size)
            .with_depth_slices(self.slices)
            .with_max_lights_per_cluster(self.max_lights_per_cluster);
        RendererConfig::default()
            .with_mode(self.mode)
            .with_num_lights(self.lights)
            .with_cluster(cluster)
            .with_light_seed(self.seed)
    }
}
