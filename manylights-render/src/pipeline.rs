//! Bind group layout and pipeline creation for the compute kernels and the
//! three shading strategies. Every module is composed from the shared WGSL
//! sources with the cluster constants of the active [`ClusterConfig`].

use manylights_gpu_shared::clustering::ClusterConfig;
use manylights_gpu_shared::shaders;

use crate::render_targets::{
    DEPTH_FORMAT, GBUFFER_ALBEDO_FORMAT, GBUFFER_NORMAL_FORMAT, GBUFFER_POSITION_FORMAT,
};
use crate::mesh::Vertex;

fn shader_module(device: &wgpu::Device, label: &str, source: String) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn unfilterable_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Interleaved `pos3, nor3, uv2` layout shared by every geometry pass.
fn scene_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn depth_stencil_rw() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn opaque_target(format: wgpu::TextureFormat) -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })
}

fn scene_primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        cull_mode: Some(wgpu::Face::Back),
        ..Default::default()
    }
}

// ============================================================
// Move Lights (compute)
// ============================================================

pub fn create_move_lights_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Move Lights BGL"),
        entries: &[
            storage_entry(0, wgpu::ShaderStages::COMPUTE, false),
            uniform_entry(1, wgpu::ShaderStages::COMPUTE),
        ],
    })
}

pub fn create_move_lights_pipeline(
    device: &wgpu::Device,
    config: &ClusterConfig,
    bgl: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let module = shader_module(device, "Move Lights Compute", shaders::move_lights_source(config));

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Move Lights Pipeline Layout"),
        bind_group_layouts: &[bgl],
        push_constant_ranges: &[],
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Move Lights Pipeline"),
        layout: Some(&layout),
        module: &module,
        entry_point: Some("main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    })
}

// ============================================================
// Clustering (compute)
// ============================================================

/// 0 light set, 1 camera, 2 canvas, 3 grid, 4 cluster set (read-write).
pub fn create_clustering_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Clustering BGL"),
        entries: &[
            storage_entry(0, wgpu::ShaderStages::COMPUTE, true),
            uniform_entry(1, wgpu::ShaderStages::COMPUTE),
            uniform_entry(2, wgpu::ShaderStages::COMPUTE),
            uniform_entry(3, wgpu::ShaderStages::COMPUTE),
            storage_entry(4, wgpu::ShaderStages::COMPUTE, false),
        ],
    })
}

pub fn create_clustering_pipeline(
    device: &wgpu::Device,
    config: &ClusterConfig,
    bgl: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let module = shader_module(device, "Clustering Compute", shaders::clustering_source(config));

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Clustering Pipeline Layout"),
        bind_group_layouts: &[bgl],
        push_constant_ranges: &[],
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Clustering Pipeline"),
        layout: Some(&layout),
        module: &module,
        entry_point: Some("main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    })
}

// ============================================================
// Scene bind group layouts (groups 1 and 2 of every geometry pass)
// ============================================================

pub fn create_model_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Model BGL"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
    })
}

pub fn create_material_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Material BGL"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

// ============================================================
// Naive Pipeline
// ============================================================

/// 0 camera, 1 light set.
pub fn create_naive_scene_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Naive Scene BGL"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
            storage_entry(1, wgpu::ShaderStages::FRAGMENT, true),
        ],
    })
}

pub fn create_naive_pipeline(
    device: &wgpu::Device,
    config: &ClusterConfig,
    scene_bgl: &wgpu::BindGroupLayout,
    model_bgl: &wgpu::BindGroupLayout,
    material_bgl: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let vert_module = shader_module(device, "Geometry Vertex", shaders::geometry_vert_source(config));
    let frag_module = shader_module(device, "Naive Fragment", shaders::naive_frag_source(config));

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Naive Pipeline Layout"),
        bind_group_layouts: &[scene_bgl, model_bgl, material_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Naive Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &vert_module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[scene_vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &frag_module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[opaque_target(color_format)],
        }),
        primitive: scene_primitive_state(),
        depth_stencil: Some(depth_stencil_rw()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

// ============================================================
// Forward+ Pipeline
// ============================================================

/// 0 camera, 1 light set, 2 cluster set, 3 grid, 4 canvas. Shared by the
/// Forward+ fragment stage and the deferred resolve.
pub fn create_clustered_scene_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Clustered Scene BGL"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
            storage_entry(1, wgpu::ShaderStages::FRAGMENT, true),
            storage_entry(2, wgpu::ShaderStages::FRAGMENT, true),
            uniform_entry(3, wgpu::ShaderStages::FRAGMENT),
            uniform_entry(4, wgpu::ShaderStages::FRAGMENT),
        ],
    })
}

pub fn create_forward_plus_pipeline(
    device: &wgpu::Device,
    config: &ClusterConfig,
    scene_bgl: &wgpu::BindGroupLayout,
    model_bgl: &wgpu::BindGroupLayout,
    material_bgl: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let vert_module = shader_module(device, "Geometry Vertex", shaders::geometry_vert_source(config));
    let frag_module = shader_module(
        device,
        "Forward+ Fragment",
        shaders::forward_plus_frag_source(config),
    );

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Forward+ Pipeline Layout"),
        bind_group_layouts: &[scene_bgl, model_bgl, material_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Forward+ Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &vert_module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[scene_vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &frag_module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[opaque_target(color_format)],
        }),
        primitive: scene_primitive_state(),
        depth_stencil: Some(depth_stencil_rw()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

// ============================================================
// Clustered Deferred: G-Buffer Pipeline
// ============================================================

/// Group 0 of the G-buffer pass: camera only.
pub fn create_camera_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Camera BGL"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
    })
}

pub fn create_gbuffer_pipeline(
    device: &wgpu::Device,
    config: &ClusterConfig,
    camera_bgl: &wgpu::BindGroupLayout,
    model_bgl: &wgpu::BindGroupLayout,
    material_bgl: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let vert_module = shader_module(device, "Geometry Vertex", shaders::geometry_vert_source(config));
    let frag_module = shader_module(device, "GBuffer Fragment", shaders::gbuffer_frag_source(config));

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("GBuffer Pipeline Layout"),
        bind_group_layouts: &[camera_bgl, model_bgl, material_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("GBuffer Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &vert_module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[scene_vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &frag_module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[
                opaque_target(GBUFFER_POSITION_FORMAT),
                opaque_target(GBUFFER_NORMAL_FORMAT),
                opaque_target(GBUFFER_ALBEDO_FORMAT),
            ],
        }),
        primitive: scene_primitive_state(),
        depth_stencil: Some(depth_stencil_rw()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

// ============================================================
// Clustered Deferred: Resolve Pipeline
// ============================================================

/// 0 position, 1 normal, 2 albedo; read with `textureLoad`.
pub fn create_gbuffer_read_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("GBuffer Read BGL"),
        entries: &[
            unfilterable_texture_entry(0),
            unfilterable_texture_entry(1),
            unfilterable_texture_entry(2),
        ],
    })
}

pub fn create_resolve_pipeline(
    device: &wgpu::Device,
    config: &ClusterConfig,
    scene_bgl: &wgpu::BindGroupLayout,
    gbuffer_bgl: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = shader_module(
        device,
        "Deferred Resolve",
        shaders::deferred_resolve_source(config),
    );

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Resolve Pipeline Layout"),
        bind_group_layouts: &[scene_bgl, gbuffer_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Resolve Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[opaque_target(color_format)],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
