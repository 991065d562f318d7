//! GPU-facing data shared by every manylights crate: `#[repr(C)]` buffer
//! layouts, the embedded WGSL sources, and the host reference of the cluster
//! grid math.

pub mod clustering;
pub mod shaders;
pub mod uniforms;
