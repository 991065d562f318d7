//! Blocking GPU to CPU copies for diagnostics and tests.

use futures_intrusive::channel::shared::oneshot_channel;

use crate::error::{RenderError, RenderResult};

fn align_bpr(value: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    value.div_ceil(align) * align
}

/// Copies `size` bytes of `src` starting at `offset` into host memory.
/// `src` needs `COPY_SRC`; offset and size must be multiples of 4.
pub fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Buffer,
    offset: u64,
    size: u64,
) -> RenderResult<Vec<u8>> {
    if size == 0 {
        return Ok(Vec::new());
    }
    if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || size % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
        return Err(RenderError::readback(format!(
            "unaligned buffer readback (offset {offset}, size {size})"
        )));
    }
    if offset + size > src.size() {
        return Err(RenderError::readback(format!(
            "readback range {offset}..{} exceeds buffer size {}",
            offset + size,
            src.size()
        )));
    }

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging"),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_buffer_to_buffer(src, offset, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    map_and_copy(device, &staging, |data| data.to_vec())
}

/// Reads an RGBA8 texture back with row padding removed.
pub fn read_texture_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Texture,
) -> RenderResult<Vec<u8>> {
    match src.format() {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {}
        other => {
            return Err(RenderError::readback(format!(
                "expected an RGBA8 texture, got {other:?}"
            )))
        }
    }

    let (width, height) = (src.width(), src.height());
    let tight_bpr = 4 * width;
    let padded_bpr = align_bpr(tight_bpr);

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Texture Readback Staging"),
        size: padded_bpr as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Texture Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: src,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    map_and_copy(device, &staging, |data| {
        let mut tight = Vec::with_capacity((tight_bpr * height) as usize);
        for row in 0..height as usize {
            let start = row * padded_bpr as usize;
            tight.extend_from_slice(&data[start..start + tight_bpr as usize]);
        }
        tight
    })
}

fn map_and_copy<T>(
    device: &wgpu::Device,
    staging: &wgpu::Buffer,
    copy: impl FnOnce(&[u8]) -> T,
) -> RenderResult<T> {
    let slice = staging.slice(..);
    let (sender, receiver) = oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    pollster::block_on(receiver.receive())
        .ok_or_else(|| RenderError::readback("map_async callback channel dropped"))?
        .map_err(RenderError::readback)?;

    let data = slice.get_mapped_range();
    let out = copy(&data);
    drop(data);
    staging.unmap();
    Ok(out)
}
