//! Clustered many-light renderer on wgpu.
//!
//! A [`Stage`](stage::Stage) owns the GPU context, scene, camera, light store
//! and cluster builder. A [`RendererSlot`](slot::RendererSlot) drives exactly
//! one [`RenderStrategy`](strategy::RenderStrategy) (naive, Forward+ or
//! clustered deferred) from a single-threaded frame loop.

pub mod camera;
pub mod clusters;
pub mod config;
pub mod context;
pub mod error;
pub mod frame_loop;
pub mod lights;
pub mod mesh;
pub mod passes;
pub mod pipeline;
pub mod readback;
pub mod render_targets;
pub mod renderers;
pub mod scene;
pub mod slot;
pub mod stage;
pub mod strategy;

pub use config::RendererConfig;
pub use error::{RenderError, RenderResult};
pub use manylights_gpu_shared::clustering::ClusterConfig;
pub use slot::RendererSlot;
pub use stage::Stage;
pub use strategy::{RenderMode, RenderStrategy};
