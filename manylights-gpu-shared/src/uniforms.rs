use bytemuck::{Pod, Zeroable};

/// Capacity of the light set. The storage buffer is always sized for this many
/// lights; only the first `num_lights` entries are live.
pub const MAX_LIGHTS: u32 = 5000;

/// Intensity every light is created with.
pub const LIGHT_INTENSITY: f32 = 0.1;

/// Irradiance below which a light is treated as contributing nothing.
/// Determines the influence radius: `sqrt(intensity / LIGHT_CUTOFF)`.
pub const LIGHT_CUTOFF: f32 = 0.025;

/// Threads per workgroup of the move-lights kernel (1D).
pub const MOVE_LIGHTS_WORKGROUP_SIZE: u32 = 128;

/// Threads per workgroup of the clustering kernel, one thread per cluster.
pub const CLUSTER_WORKGROUP_SIZE: [u32; 3] = [4, 4, 4];

/// World-space box the animated lights are kept inside.
pub const LIGHT_BOUNDS_MIN: [f32; 3] = [-14.0, 0.2, -14.0];
pub const LIGHT_BOUNDS_MAX: [f32; 3] = [14.0, 8.0, 14.0];

/// Radius and height of the per-light orbit around its home position.
pub const LIGHT_ORBIT_RADIUS: f32 = 1.5;
pub const LIGHT_ORBIT_HEIGHT: f32 = 0.75;

/// Ambient term added by every shading path.
pub const AMBIENT: f32 = 0.02;

/// Color of pixels no geometry covers (linear).
pub const CLEAR_COLOR: [f32; 3] = [0.0, 0.0, 0.0];

/// Camera data, bound at group 0 binding 0 of every pass and by the
/// clustering kernel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
    pub near: f32,
    pub far: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

/// One point light in the light set storage buffer (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightData {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub _pad: f32,
}

impl LightData {
    pub fn new(position: [f32; 3], color: [f32; 3], intensity: f32) -> Self {
        Self {
            position,
            intensity,
            color,
            _pad: 0.0,
        }
    }
}

/// Header in front of the light array. WGSL places the runtime array at the
/// 16-byte alignment of `Light`, so the header occupies a full 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct LightSetHeader {
    pub num_lights: u32,
    pub _pad: [u32; 3],
}

/// Cluster grid dimensions, shared by the clustering kernel and every shading
/// pass that looks clusters up.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ClusterGridUniforms {
    pub num_slices: [u32; 3],
    pub tile_size: u32,
}

/// Canvas size in pixels.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CanvasUniforms {
    pub width: u32,
    pub height: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

impl CanvasUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            _pad1: 0,
            _pad2: 0,
        }
    }
}

/// Animation clock for the move-lights kernel, in seconds.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct TimeUniforms {
    pub seconds: f32,
    pub _pad1: f32,
    pub _pad2: f32,
    pub _pad3: f32,
}

/// Per-node transform, bound at group 1 binding 0 of the geometry passes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

/// Size in bytes of the light set buffer (header plus full capacity).
pub const fn light_set_size() -> u64 {
    (std::mem::size_of::<LightSetHeader>() + MAX_LIGHTS as usize * std::mem::size_of::<LightData>())
        as u64
}

/// Stride of one cluster record: `count` followed by `max_lights_per_cluster`
/// indices.
pub const fn cluster_stride(max_lights_per_cluster: u32) -> u64 {
    4 + 4 * max_lights_per_cluster as u64
}

/// Size in bytes of the cluster set buffer: `numClusters` header followed by
/// the cluster records.
pub const fn cluster_set_size(num_clusters: u32, max_lights_per_cluster: u32) -> u64 {
    4 + num_clusters as u64 * cluster_stride(max_lights_per_cluster)
}
