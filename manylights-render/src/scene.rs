//! Scene provider: GPU-resident nodes, materials and primitives, visited in
//! nesting order by the geometry passes.

use glam::Mat4;
use image::RgbaImage;
use manylights_gpu_shared::uniforms::ModelUniforms;
use wgpu::util::DeviceExt;

use crate::mesh::MeshData;
use crate::pipeline;

/// Vertex and index buffers of one indexed triangle list.
pub struct GpuPrimitive {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Diffuse texture and its bind group (group 2 of the geometry passes).
pub struct GpuMaterial {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
}

/// Per-node transform and its bind group (group 1 of the geometry passes).
pub struct GpuNode {
    pub transform: Mat4,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Receives scene elements in nesting order: a node, then for each of its
/// draws a material followed by the primitive drawn with it.
pub trait SceneVisitor {
    fn node(&mut self, node: &GpuNode);
    fn material(&mut self, material: &GpuMaterial);
    fn primitive(&mut self, primitive: &GpuPrimitive);
}

pub trait SceneProvider {
    fn iterate(&self, visitor: &mut dyn SceneVisitor);
}

/// Bind group layouts scene resources are created against.
pub struct SceneLayouts {
    pub model: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
}

impl SceneLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            model: pipeline::create_model_bgl(device),
            material: pipeline::create_material_bgl(device),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialId(usize);

struct SceneNode {
    gpu: GpuNode,
    draws: Vec<(MaterialId, MeshId)>,
}

#[derive(Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    materials: Vec<GpuMaterial>,
    primitives: Vec<GpuPrimitive>,
}

impl Scene {
    pub fn empty() -> Self {
        Self::default()
    }
}

impl SceneProvider for Scene {
    fn iterate(&self, visitor: &mut dyn SceneVisitor) {
        for node in &self.nodes {
            visitor.node(&node.gpu);
            for &(MaterialId(material), MeshId(mesh)) in &node.draws {
                visitor.material(&self.materials[material]);
                visitor.primitive(&self.primitives[mesh]);
            }
        }
    }
}

/// Uploads meshes, textures and nodes and assembles a [`Scene`].
pub struct SceneBuilder<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    layouts: &'a SceneLayouts,
    scene: Scene,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue, layouts: &'a SceneLayouts) -> Self {
        Self {
            device,
            queue,
            layouts,
            scene: Scene::default(),
        }
    }

    pub fn add_mesh(&mut self, label: &str, mesh: &MeshData) -> MeshId {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        self.scene.primitives.push(GpuPrimitive {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        });
        MeshId(self.scene.primitives.len() - 1)
    }

    pub fn add_material(&mut self, label: &str, image: &RgbaImage) -> MaterialId {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Diffuse Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Material BG")),
            layout: &self.layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        self.scene.materials.push(GpuMaterial {
            texture,
            view,
            sampler,
            bind_group,
        });
        MaterialId(self.scene.materials.len() - 1)
    }

    pub fn add_node(&mut self, transform: Mat4, draws: &[(MaterialId, MeshId)]) {
        let uniforms = ModelUniforms {
            model: transform.to_cols_array_2d(),
            normal_matrix: transform.inverse().transpose().to_cols_array_2d(),
        };
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Model Uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model BG"),
            layout: &self.layouts.model,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        self.scene.nodes.push(SceneNode {
            gpu: GpuNode {
                transform,
                uniform_buffer,
                bind_group,
            },
            draws: draws.to_vec(),
        });
    }

    pub fn build(self) -> Scene {
        log::info!(
            "Scene built: {} nodes, {} materials, {} primitives",
            self.scene.nodes.len(),
            self.scene.materials.len(),
            self.scene.primitives.len()
        );
        self.scene
    }
}

/// Two-color checkerboard with `cells` squares per side.
pub fn checker_texture(size: u32, cells: u32, a: [u8; 3], b: [u8; 3]) -> RgbaImage {
    let cell = (size / cells.max(1)).max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        let [r, g, bl] = if (x / cell + y / cell) % 2 == 0 { a } else { b };
        image::Rgba([r, g, bl, 255])
    })
}

/// Single-color texture.
pub fn solid_texture(color: [u8; 3]) -> RgbaImage {
    let [r, g, b] = color;
    RgbaImage::from_pixel(4, 4, image::Rgba([r, g, b, 255]))
}
