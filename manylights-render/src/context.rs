//! GPU device bootstrap and the canvas the renderer draws into.

use crate::error::{RenderError, RenderResult};

/// Color format used for offscreen canvases (headless tests, readbacks).
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Device, queue and canvas description shared by every renderer component.
pub struct GpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Format of the per-frame target view.
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

/// Limits requested from the adapter: downlevel defaults, raised to the
/// adapter's texture and storage sizes so large canvases keep working.
pub fn required_limits(adapter: &wgpu::Adapter) -> wgpu::Limits {
    let supported = adapter.limits();
    wgpu::Limits {
        max_storage_buffer_binding_size: supported.max_storage_buffer_binding_size,
        max_buffer_size: supported.max_buffer_size,
        ..wgpu::Limits::downlevel_defaults()
    }
    .using_resolution(supported)
}

pub async fn request_device(adapter: &wgpu::Adapter) -> RenderResult<(wgpu::Device, wgpu::Queue)> {
    let info = adapter.get_info();
    log::info!("Using adapter {} ({:?})", info.name, info.backend);

    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Manylights Device"),
                required_features: wgpu::Features::empty(),
                required_limits: required_limits(adapter),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await
        .map_err(RenderError::device)
}

impl GpuContext {
    pub fn from_parts(
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            adapter,
            device,
            queue,
            format,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Context without a surface. The caller supplies a target view per frame.
    pub fn headless(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::AdapterUnavailable)?;

        let (device, queue) = pollster::block_on(request_device(&adapter))?;
        Ok(Self::from_parts(adapter, device, queue, HEADLESS_FORMAT, width, height))
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Fails with [`RenderError::Limits`] when a storage buffer of `bytes`
    /// cannot be created or bound on this device.
    pub fn check_storage_size(&self, what: &str, bytes: u64) -> RenderResult<()> {
        let limits = self.device.limits();
        let max_binding = limits.max_storage_buffer_binding_size as u64;
        if bytes > max_binding || bytes > limits.max_buffer_size {
            return Err(RenderError::Limits(format!(
                "{what} needs {bytes} bytes, device allows {} (binding) / {} (buffer)",
                max_binding, limits.max_buffer_size
            )));
        }
        Ok(())
    }

    /// Offscreen color texture usable as a frame target and copy source.
    pub fn create_offscreen_target(&self) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Target"),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }
}
