//! Depth and G-buffer targets sized to the canvas.

/// Depth format of every depth-tested pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// World-space position; `w = 1` marks covered pixels. Half floats, since
/// 32-bit float targets are not renderable on downlevel adapters.
pub const GBUFFER_POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// World-space normal.
pub const GBUFFER_NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Sampled diffuse color.
pub const GBUFFER_ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub struct DepthTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl DepthTarget {
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

/// G-buffer of the clustered deferred strategy.
pub struct GBuffer {
    pub position: wgpu::Texture,
    pub position_view: wgpu::TextureView,
    pub normal: wgpu::Texture,
    pub normal_view: wgpu::TextureView,
    pub albedo: wgpu::Texture,
    pub albedo_view: wgpu::TextureView,
    pub depth: DepthTarget,
    pub width: u32,
    pub height: u32,
}

impl GBuffer {
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}

pub fn create_depth_target(device: &wgpu::Device, width: u32, height: u32, label: &str) -> DepthTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    DepthTarget {
        texture,
        view,
        width,
        height,
    }
}

fn create_gbuffer_texture(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Creates the three G-buffer attachments plus depth at canvas size.
pub fn create_gbuffer(device: &wgpu::Device, width: u32, height: u32) -> GBuffer {
    let (position, position_view) =
        create_gbuffer_texture(device, "GBuffer Position", GBUFFER_POSITION_FORMAT, width, height);
    let (normal, normal_view) =
        create_gbuffer_texture(device, "GBuffer Normal", GBUFFER_NORMAL_FORMAT, width, height);
    let (albedo, albedo_view) =
        create_gbuffer_texture(device, "GBuffer Albedo", GBUFFER_ALBEDO_FORMAT, width, height);
    let depth = create_depth_target(device, width, height, "GBuffer Depth");

    log::info!("G-Buffer created ({}x{})", width, height);

    GBuffer {
        position,
        position_view,
        normal,
        normal_view,
        albedo,
        albedo_view,
        depth,
        width,
        height,
    }
}
