//! Embedded WGSL sources and the composition step that turns them into
//! complete shader modules.
//!
//! WGSL has no include mechanism and pipeline-overridable constants cannot size
//! arrays, so every module is assembled on the host: a generated block of
//! `const` declarations first, then the shared declarations, then the stage
//! source. Module-scope declarations in WGSL are order independent, so shared
//! functions may reference bindings declared further down.

use crate::clustering::ClusterConfig;
use crate::uniforms::{
    AMBIENT, CLEAR_COLOR, CLUSTER_WORKGROUP_SIZE, LIGHT_BOUNDS_MAX, LIGHT_BOUNDS_MIN,
    LIGHT_CUTOFF, LIGHT_ORBIT_HEIGHT, LIGHT_ORBIT_RADIUS, MAX_LIGHTS, MOVE_LIGHTS_WORKGROUP_SIZE,
};

pub const COMMON: &str = include_str!("../shaders/common.wgsl");
pub const CLUSTERED_SHADING: &str = include_str!("../shaders/clustered_shading.wgsl");
pub const MOVE_LIGHTS_COMPUTE: &str = include_str!("../shaders/move_lights.wgsl");
pub const CLUSTERING_COMPUTE: &str = include_str!("../shaders/clustering.wgsl");
pub const GEOMETRY_VERT: &str = include_str!("../shaders/geometry_vert.wgsl");
pub const NAIVE_FRAG: &str = include_str!("../shaders/naive_frag.wgsl");
pub const FORWARD_PLUS_FRAG: &str = include_str!("../shaders/forward_plus_frag.wgsl");
pub const GBUFFER_FRAG: &str = include_str!("../shaders/gbuffer_frag.wgsl");
pub const DEFERRED_RESOLVE: &str = include_str!("../shaders/deferred_resolve.wgsl");

fn vec3_literal(v: [f32; 3]) -> String {
    format!("vec3f({:?}, {:?}, {:?})", v[0], v[1], v[2])
}

/// Generated `const` block prepended to every module.
pub fn constants_prelude(config: &ClusterConfig) -> String {
    let [wx, wy, wz] = CLUSTER_WORKGROUP_SIZE;
    let mut out = String::new();
    out.push_str("// Generated constants.\n");
    out.push_str(&format!("const MAX_LIGHTS: u32 = {MAX_LIGHTS}u;\n"));
    out.push_str(&format!(
        "const MAX_LIGHTS_PER_CLUSTER: u32 = {}u;\n",
        config.max_lights_per_cluster
    ));
    out.push_str(&format!("const LIGHT_CUTOFF: f32 = {LIGHT_CUTOFF:?};\n"));
    out.push_str(&format!(
        "const MOVE_LIGHTS_WORKGROUP_SIZE: u32 = {MOVE_LIGHTS_WORKGROUP_SIZE}u;\n"
    ));
    out.push_str(&format!("const CLUSTER_WORKGROUP_X: u32 = {wx}u;\n"));
    out.push_str(&format!("const CLUSTER_WORKGROUP_Y: u32 = {wy}u;\n"));
    out.push_str(&format!("const CLUSTER_WORKGROUP_Z: u32 = {wz}u;\n"));
    out.push_str(&format!(
        "const LIGHT_BOUNDS_MIN: vec3f = {};\n",
        vec3_literal(LIGHT_BOUNDS_MIN)
    ));
    out.push_str(&format!(
        "const LIGHT_BOUNDS_MAX: vec3f = {};\n",
        vec3_literal(LIGHT_BOUNDS_MAX)
    ));
    out.push_str(&format!("const LIGHT_ORBIT_RADIUS: f32 = {LIGHT_ORBIT_RADIUS:?};\n"));
    out.push_str(&format!("const LIGHT_ORBIT_HEIGHT: f32 = {LIGHT_ORBIT_HEIGHT:?};\n"));
    out.push_str(&format!("const AMBIENT: f32 = {AMBIENT:?};\n"));
    out.push_str(&format!(
        "const CLEAR_COLOR: vec3f = {};\n",
        vec3_literal(CLEAR_COLOR)
    ));
    out
}

/// Prelude + shared declarations + the given sources, in order.
pub fn compose(config: &ClusterConfig, sources: &[&str]) -> String {
    let mut out = constants_prelude(config);
    out.push('\n');
    out.push_str(COMMON);
    for source in sources {
        out.push('\n');
        out.push_str(source);
    }
    out
}

pub fn move_lights_source(config: &ClusterConfig) -> String {
    compose(config, &[MOVE_LIGHTS_COMPUTE])
}

pub fn clustering_source(config: &ClusterConfig) -> String {
    compose(config, &[CLUSTERING_COMPUTE])
}

pub fn geometry_vert_source(config: &ClusterConfig) -> String {
    compose(config, &[GEOMETRY_VERT])
}

pub fn naive_frag_source(config: &ClusterConfig) -> String {
    compose(config, &[NAIVE_FRAG])
}

pub fn forward_plus_frag_source(config: &ClusterConfig) -> String {
    compose(config, &[CLUSTERED_SHADING, FORWARD_PLUS_FRAG])
}

pub fn gbuffer_frag_source(config: &ClusterConfig) -> String {
    compose(config, &[GBUFFER_FRAG])
}

pub fn deferred_resolve_source(config: &ClusterConfig) -> String {
    compose(config, &[CLUSTERED_SHADING, DEFERRED_RESOLVE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_carries_cluster_capacity() {
        let config = ClusterConfig::default().with_max_lights_per_cluster(123);
        let prelude = constants_prelude(&config);
        assert!(prelude.contains("const MAX_LIGHTS_PER_CLUSTER: u32 = 123u;"));
        assert!(prelude.contains("const CLUSTER_WORKGROUP_X: u32 = 4u;"));
        assert!(prelude.contains("const LIGHT_CUTOFF: f32 = 0.025;"));
    }

    #[test]
    fn test_float_literals_are_valid_wgsl() {
        let prelude = constants_prelude(&ClusterConfig::default());
        assert!(prelude.contains("vec3f(-14.0, 0.2, -14.0)"));
        assert!(prelude.contains("const AMBIENT: f32 = 0.02;"));
    }

    #[test]
    fn test_forward_plus_and_resolve_share_shading() {
        let config = ClusterConfig::default();
        let forward = forward_plus_frag_source(&config);
        let resolve = deferred_resolve_source(&config);
        assert!(forward.contains(CLUSTERED_SHADING));
        assert!(resolve.contains(CLUSTERED_SHADING));
        assert!(forward.contains("shadeClustered(fragCoord"));
        assert!(resolve.contains("shadeClustered(fragPos.xy"));
    }

    #[test]
    fn test_prelude_comes_first() {
        let source = clustering_source(&ClusterConfig::default());
        assert!(source.starts_with("// Generated constants."));
        let common_at = source.find("struct LightSet").unwrap();
        let kernel_at = source.find("fn screenToView").unwrap();
        assert!(common_at < kernel_at);
    }
}
