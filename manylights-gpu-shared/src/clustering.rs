//! Host-side reference of the cluster grid math.
//!
//! Mirrors `clustering.wgsl` and the cluster lookup in `clustered_shading.wgsl`
//! operation for operation. The GPU kernel is tested against it.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::uniforms::{
    CameraUniforms, ClusterGridUniforms, LightData, AMBIENT, CLUSTER_WORKGROUP_SIZE, LIGHT_CUTOFF,
};

/// Cluster grid parameters chosen at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Edge of a screen tile in pixels.
    pub tile_size: u32,
    /// Number of logarithmic depth slices.
    pub depth_slices: u32,
    /// Capacity of each cluster's index list.
    pub max_lights_per_cluster: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            tile_size: 64,
            depth_slices: 24,
            max_lights_per_cluster: 500,
        }
    }
}

impl ClusterConfig {
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    pub fn with_depth_slices(mut self, depth_slices: u32) -> Self {
        self.depth_slices = depth_slices.max(1);
        self
    }

    pub fn with_max_lights_per_cluster(mut self, max: u32) -> Self {
        self.max_lights_per_cluster = max.max(1);
        self
    }
}

/// Grid dimensions derived from the canvas size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterGrid {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub num_slices: [u32; 3],
}

impl ClusterGrid {
    pub fn new(width: u32, height: u32, config: &ClusterConfig) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let tile_size = config.tile_size.max(1);
        Self {
            width,
            height,
            tile_size,
            num_slices: [
                width.div_ceil(tile_size),
                height.div_ceil(tile_size),
                config.depth_slices.max(1),
            ],
        }
    }

    pub fn num_clusters(&self) -> u32 {
        self.num_slices[0] * self.num_slices[1] * self.num_slices[2]
    }

    /// Workgroups to dispatch per axis so every cluster gets one invocation.
    pub fn workgroups(&self) -> [u32; 3] {
        [
            self.num_slices[0].div_ceil(CLUSTER_WORKGROUP_SIZE[0]),
            self.num_slices[1].div_ceil(CLUSTER_WORKGROUP_SIZE[1]),
            self.num_slices[2].div_ceil(CLUSTER_WORKGROUP_SIZE[2]),
        ]
    }

    pub fn cluster_index(&self, x: u32, y: u32, z: u32) -> u32 {
        x + y * self.num_slices[0] + z * self.num_slices[0] * self.num_slices[1]
    }

    /// Inverse of [`cluster_index`](Self::cluster_index).
    pub fn cluster_coords(&self, index: u32) -> [u32; 3] {
        let plane = self.num_slices[0] * self.num_slices[1];
        let z = index / plane;
        let rem = index % plane;
        [rem % self.num_slices[0], rem / self.num_slices[0], z]
    }

    /// Whether the grid was built for a canvas of this size.
    pub fn matches_canvas(&self, width: u32, height: u32) -> bool {
        self.width == width.max(1) && self.height == height.max(1)
    }

    pub fn uniforms(&self) -> ClusterGridUniforms {
        ClusterGridUniforms {
            num_slices: self.num_slices,
            tile_size: self.tile_size,
        }
    }

    /// Cluster a fragment at pixel `frag` with positive view depth falls in.
    pub fn fragment_cluster(&self, frag: Vec2, view_depth: f32, near: f32, far: f32) -> u32 {
        let px = frag.max(Vec2::ZERO);
        let x = (px.x as u32 / self.tile_size).min(self.num_slices[0] - 1);
        let y = (px.y as u32 / self.tile_size).min(self.num_slices[1] - 1);
        let z = depth_slice(view_depth, near, far, self.num_slices[2]);
        self.cluster_index(x, y, z)
    }
}

pub fn light_radius(intensity: f32) -> f32 {
    (intensity.max(0.0) / LIGHT_CUTOFF).sqrt()
}

/// Windowed inverse-square falloff; zero at and beyond `radius`.
pub fn light_falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    let ratio = distance / radius;
    let window = (1.0 - ratio.powi(4)).clamp(0.0, 1.0);
    window * window / (distance * distance).max(1e-4)
}

pub fn depth_slice(view_depth: f32, near: f32, far: f32, slices: u32) -> u32 {
    let depth = view_depth.clamp(near, far);
    let t = (depth / near).ln() / (far / near).ln();
    ((t.max(0.0) * slices as f32) as u32).min(slices - 1)
}

pub fn slice_depth(slice: u32, near: f32, far: f32, slices: u32) -> f32 {
    near * (far / near).powf(slice as f32 / slices as f32)
}

pub fn sphere_intersects_aabb(center: Vec3, radius: f32, min: Vec3, max: Vec3) -> bool {
    let closest = center.clamp(min, max);
    (center - closest).length_squared() <= radius * radius
}

/// Camera state the clustering math depends on.
#[derive(Clone, Copy, Debug)]
pub struct ClusterView {
    pub view: Mat4,
    pub inv_proj: Mat4,
    pub near: f32,
    pub far: f32,
}

impl ClusterView {
    pub fn from_uniforms(camera: &CameraUniforms) -> Self {
        Self {
            view: Mat4::from_cols_array_2d(&camera.view),
            inv_proj: Mat4::from_cols_array_2d(&camera.inv_proj),
            near: camera.near,
            far: camera.far,
        }
    }

    fn screen_to_view(&self, grid: &ClusterGrid, pixel: Vec2) -> Vec3 {
        let ndc = Vec2::new(
            pixel.x / grid.width as f32 * 2.0 - 1.0,
            1.0 - pixel.y / grid.height as f32 * 2.0,
        );
        let view = self.inv_proj * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        view.truncate() / view.w
    }

    /// View-space bounding box of cluster `(x, y, z)`.
    pub fn cluster_aabb(&self, grid: &ClusterGrid, x: u32, y: u32, z: u32) -> (Vec3, Vec3) {
        let tile = grid.tile_size as f32;
        let min_px = Vec2::new(x as f32, y as f32) * tile;
        let max_px = min_px + Vec2::splat(tile);
        let corners = [
            self.screen_to_view(grid, Vec2::new(min_px.x, min_px.y)),
            self.screen_to_view(grid, Vec2::new(max_px.x, min_px.y)),
            self.screen_to_view(grid, Vec2::new(min_px.x, max_px.y)),
            self.screen_to_view(grid, Vec2::new(max_px.x, max_px.y)),
        ];
        let slices = grid.num_slices[2];
        let near_depth = slice_depth(z, self.near, self.far, slices);
        let far_depth = slice_depth(z + 1, self.near, self.far, slices);

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for corner in corners {
            for depth in [near_depth, far_depth] {
                let p = corner * (depth / -corner.z);
                min = min.min(p);
                max = max.max(p);
            }
        }
        (min, max)
    }
}

/// Per-cluster light lists produced by [`assign_lights`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterAssignment {
    pub clusters: Vec<Vec<u32>>,
}

impl ClusterAssignment {
    pub fn count(&self, cluster: u32) -> u32 {
        self.clusters[cluster as usize].len() as u32
    }

    pub fn non_empty(&self) -> impl Iterator<Item = (u32, &[u32])> {
        self.clusters
            .iter()
            .enumerate()
            .filter(|(_, lights)| !lights.is_empty())
            .map(|(i, lights)| (i as u32, lights.as_slice()))
    }
}

/// Assigns every live light in `lights` to the clusters its influence sphere
/// touches. Lists keep light order and stop at `max_lights_per_cluster`.
pub fn assign_lights(
    grid: &ClusterGrid,
    view: &ClusterView,
    lights: &[LightData],
    max_lights_per_cluster: u32,
) -> ClusterAssignment {
    let mut clusters = vec![Vec::new(); grid.num_clusters() as usize];
    let [nx, ny, nz] = grid.num_slices;
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let (min, max) = view.cluster_aabb(grid, x, y, z);
                let list = &mut clusters[grid.cluster_index(x, y, z) as usize];
                for (i, light) in lights.iter().enumerate() {
                    let radius = light_radius(light.intensity);
                    if radius <= 0.0 {
                        continue;
                    }
                    let center = view.view.transform_point3(Vec3::from(light.position));
                    if sphere_intersects_aabb(center, radius, min, max) {
                        if list.len() as u32 == max_lights_per_cluster {
                            break;
                        }
                        list.push(i as u32);
                    }
                }
            }
        }
    }
    ClusterAssignment { clusters }
}

pub fn point_light_contribution(light: &LightData, world_pos: Vec3, normal: Vec3) -> Vec3 {
    let to_light = Vec3::from(light.position) - world_pos;
    let distance = to_light.length();
    let falloff = light_falloff(distance, light_radius(light.intensity));
    let lambert = normal.dot(to_light / distance.max(1e-4)).max(0.0);
    Vec3::from(light.color) * light.intensity * lambert * falloff
}

/// Clustered shading of one surface sample; the host mirror of
/// `shadeClustered`.
#[allow(clippy::too_many_arguments)]
pub fn shade_clustered(
    grid: &ClusterGrid,
    view: &ClusterView,
    assignment: &ClusterAssignment,
    lights: &[LightData],
    frag: Vec2,
    world_pos: Vec3,
    normal: Vec3,
    albedo: Vec3,
) -> Vec3 {
    let view_depth = -view.view.transform_point3(world_pos).z;
    let cluster = grid.fragment_cluster(frag, view_depth, view.near, view.far);
    let normal = normal.normalize();
    let lighting = assignment.clusters[cluster as usize]
        .iter()
        .filter(|&&i| (i as usize) < lights.len())
        .map(|&i| point_light_contribution(&lights[i as usize], world_pos, normal))
        .fold(Vec3::ZERO, |acc, c| acc + c);
    albedo * (lighting + Vec3::splat(AMBIENT))
}

/// Shading with every live light, the naive baseline.
pub fn shade_all_lights(lights: &[LightData], world_pos: Vec3, normal: Vec3, albedo: Vec3) -> Vec3 {
    let normal = normal.normalize();
    let lighting = lights
        .iter()
        .map(|light| point_light_contribution(light, world_pos, normal))
        .fold(Vec3::ZERO, |acc, c| acc + c);
    albedo * (lighting + Vec3::splat(AMBIENT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::LIGHT_INTENSITY;

    const NEAR: f32 = 0.1;
    const FAR: f32 = 100.0;

    fn test_view(width: u32, height: u32) -> ClusterView {
        let proj = Mat4::perspective_rh(60f32.to_radians(), width as f32 / height as f32, NEAR, FAR);
        ClusterView {
            view: Mat4::IDENTITY,
            inv_proj: proj.inverse(),
            near: NEAR,
            far: FAR,
        }
    }

    fn tiny_light_at(position: Vec3) -> LightData {
        // radius 0.01
        LightData::new(position.into(), [1.0, 1.0, 1.0], LIGHT_CUTOFF * 1e-4)
    }

    fn aabb_center(view: &ClusterView, grid: &ClusterGrid, x: u32, y: u32, z: u32) -> Vec3 {
        let (min, max) = view.cluster_aabb(grid, x, y, z);
        (min + max) * 0.5
    }

    #[test]
    fn test_grid_dimensions_round_up() {
        let grid = ClusterGrid::new(1920, 1080, &ClusterConfig::default());
        assert_eq!(grid.num_slices, [30, 17, 24]);
        assert_eq!(grid.num_clusters(), 30 * 17 * 24);

        let grid = ClusterGrid::new(65, 1, &ClusterConfig::default());
        assert_eq!(grid.num_slices, [2, 1, 24]);
    }

    #[test]
    fn test_workgroup_coverage_has_no_idle_groups() {
        for (w, h) in [(1, 1), (64, 64), (256, 256), (800, 600), (1920, 1080), (3840, 2160)] {
            for tile in [16, 32, 64] {
                let config = ClusterConfig::default().with_tile_size(tile);
                let grid = ClusterGrid::new(w, h, &config);
                let groups = grid.workgroups();
                for axis in 0..3 {
                    let n = grid.num_slices[axis];
                    let size = CLUSTER_WORKGROUP_SIZE[axis];
                    assert!(groups[axis] * size >= n);
                    assert!((groups[axis] - 1) * size < n);
                }
            }
        }
    }

    #[test]
    fn test_cluster_index_round_trips() {
        let grid = ClusterGrid::new(800, 600, &ClusterConfig::default());
        let index = grid.cluster_index(3, 5, 7);
        assert_eq!(index, 3 + 5 * 13 + 7 * 13 * 10);
        assert_eq!(grid.cluster_coords(index), [3, 5, 7]);
    }

    #[test]
    fn test_depth_slices_are_logarithmic() {
        assert_eq!(depth_slice(NEAR, NEAR, FAR, 24), 0);
        assert_eq!(depth_slice(FAR, NEAR, FAR, 24), 23);
        assert_eq!(depth_slice(FAR * 10.0, NEAR, FAR, 24), 23);
        assert_eq!(depth_slice(0.0, NEAR, FAR, 24), 0);
        // sqrt(near * far) is the geometric middle
        let mid = (NEAR * FAR).sqrt();
        assert_eq!(depth_slice(mid * 1.001, NEAR, FAR, 24), 12);
        for slice in 0..24 {
            let start = slice_depth(slice, NEAR, FAR, 24);
            let end = slice_depth(slice + 1, NEAR, FAR, 24);
            assert_eq!(depth_slice((start * end).sqrt(), NEAR, FAR, 24), slice);
        }
    }

    #[test]
    fn test_falloff_is_zero_at_radius() {
        let radius = light_radius(LIGHT_INTENSITY);
        assert_eq!(light_falloff(radius, radius), 0.0);
        assert_eq!(light_falloff(radius * 2.0, radius), 0.0);
        assert!(light_falloff(radius * 0.5, radius) > 0.0);
        assert_eq!(light_falloff(0.5, 0.0), 0.0);
    }

    #[test]
    fn test_cluster_aabb_contains_its_fragments() {
        let grid = ClusterGrid::new(256, 256, &ClusterConfig::default());
        let view = test_view(256, 256);
        let center = aabb_center(&view, &grid, 2, 1, 12);
        let (min, max) = view.cluster_aabb(&grid, 2, 1, 12);
        assert!(min.z < center.z && center.z < max.z);
        assert!(min.x >= 0.0 && max.y > 0.0);
    }

    #[test]
    fn test_single_light_lands_in_one_cluster() {
        let grid = ClusterGrid::new(256, 256, &ClusterConfig::default());
        let view = test_view(256, 256);
        let center = aabb_center(&view, &grid, 2, 1, 12);
        let lights = [tiny_light_at(center)];

        let assignment = assign_lights(&grid, &view, &lights, 500);
        let target = grid.cluster_index(2, 1, 12);
        let hits: Vec<_> = assignment.non_empty().collect();
        assert_eq!(hits, vec![(target, &[0u32][..])]);
    }

    #[test]
    fn test_assignment_truncates_in_light_order() {
        let grid = ClusterGrid::new(256, 256, &ClusterConfig::default());
        let view = test_view(256, 256);
        let center = aabb_center(&view, &grid, 1, 2, 10);
        let lights: Vec<_> = (0..20).map(|_| tiny_light_at(center)).collect();

        let assignment = assign_lights(&grid, &view, &lights, 8);
        let target = grid.cluster_index(1, 2, 10);
        assert_eq!(assignment.count(target), 8);
        assert_eq!(assignment.clusters[target as usize], (0..8).collect::<Vec<u32>>());
    }

    #[test]
    fn test_assignment_only_references_live_lights() {
        let grid = ClusterGrid::new(256, 256, &ClusterConfig::default());
        let view = test_view(256, 256);
        let lights: Vec<_> = (0..10)
            .map(|i| {
                LightData::new([i as f32 - 5.0, 0.0, -3.0 - i as f32], [1.0; 3], LIGHT_INTENSITY)
            })
            .collect();
        let assignment = assign_lights(&grid, &view, &lights, 500);
        assert!(assignment.non_empty().count() > 0);
        for (_, list) in assignment.non_empty() {
            assert!(list.iter().all(|&i| i < 10));
        }
    }

    #[test]
    fn test_zero_intensity_light_is_culled() {
        let grid = ClusterGrid::new(256, 256, &ClusterConfig::default());
        let view = test_view(256, 256);
        let center = aabb_center(&view, &grid, 0, 0, 5);
        let lights = [LightData::new(center.into(), [1.0; 3], 0.0)];
        let assignment = assign_lights(&grid, &view, &lights, 500);
        assert_eq!(assignment.non_empty().count(), 0);
    }

    #[test]
    fn test_clustered_shading_matches_naive_inside_cluster() {
        let grid = ClusterGrid::new(256, 256, &ClusterConfig::default());
        let view = test_view(256, 256);
        let surface = Vec3::new(0.1, 0.1, -4.0);
        let lights = [
            LightData::new([0.3, 0.4, -3.5], [1.0, 0.5, 0.2], LIGHT_INTENSITY),
            LightData::new([40.0, 0.0, -50.0], [0.0, 1.0, 0.0], LIGHT_INTENSITY),
        ];
        let assignment = assign_lights(&grid, &view, &lights, 500);

        let proj = view.inv_proj.inverse();
        let clip = proj * surface.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let frag = Vec2::new((ndc.x + 1.0) * 128.0, (1.0 - ndc.y) * 128.0);

        let normal = Vec3::new(0.0, 0.0, 1.0);
        let albedo = Vec3::new(0.8, 0.8, 0.8);
        let clustered =
            shade_clustered(&grid, &view, &assignment, &lights, frag, surface, normal, albedo);
        let naive = shade_all_lights(&lights, surface, normal, albedo);
        assert!((clustered - naive).abs().max_element() < 1e-6);
        assert!(clustered.x > albedo.x * AMBIENT);
    }

    #[test]
    fn test_forward_and_deferred_inputs_shade_equally() {
        // The deferred path reconstructs the same world position (Rgba32Float)
        // and a half-precision normal.
        let grid = ClusterGrid::new(256, 256, &ClusterConfig::default());
        let view = test_view(256, 256);
        let lights = [LightData::new([0.0, 0.5, -2.5], [1.0, 1.0, 1.0], LIGHT_INTENSITY)];
        let assignment = assign_lights(&grid, &view, &lights, 500);

        let frag = Vec2::new(128.0, 120.0);
        let position = Vec3::new(0.0, 0.1, -3.0);
        let normal = Vec3::new(0.1, 0.3, 0.9).normalize();
        let quantized = (normal * 1024.0).round() / 1024.0;
        let albedo = Vec3::new(0.5, 0.25, 1.0);

        let forward =
            shade_clustered(&grid, &view, &assignment, &lights, frag, position, normal, albedo);
        let deferred =
            shade_clustered(&grid, &view, &assignment, &lights, frag, position, quantized, albedo);
        assert!((forward - deferred).abs().max_element() < 1e-3);
    }

    #[test]
    fn test_grid_matches_canvas() {
        let grid = ClusterGrid::new(640, 480, &ClusterConfig::default());
        assert!(grid.matches_canvas(640, 480));
        assert!(!grid.matches_canvas(641, 480));
    }
}
