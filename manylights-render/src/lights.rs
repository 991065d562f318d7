//! Light store: the GPU-resident light set, its live count, and the per-frame
//! move-lights kernel.

use manylights_gpu_shared::clustering::ClusterConfig;
use manylights_gpu_shared::uniforms::{
    light_set_size, LightData, LightSetHeader, TimeUniforms, LIGHT_INTENSITY, MAX_LIGHTS,
    MOVE_LIGHTS_WORKGROUP_SIZE,
};

use crate::error::{RenderError, RenderResult};
use crate::pipeline;
use crate::readback;

/// Saturated color for hue `h` in `[0, 1]`, pulled 80% of the way from white.
pub fn hue_to_rgb(h: f32) -> [f32; 3] {
    let f = |n: f32| {
        let k = (n + h * 6.0).rem_euclid(6.0);
        1.0 - k.min(4.0 - k).min(1.0).max(0.0)
    };
    let hue = [f(5.0), f(3.0), f(1.0)];
    hue.map(|c| 1.0 + (c - 1.0) * 0.8)
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Light set contents at creation: a seeded random hue per light, default
/// intensity, positions left for the first animate to fill.
pub fn initial_lights(seed: u64) -> Vec<LightData> {
    let mut state = seed;
    (0..MAX_LIGHTS)
        .map(|_| {
            let hue = (splitmix64(&mut state) >> 40) as f32 / (1u64 << 24) as f32;
            LightData::new([0.0; 3], hue_to_rgb(hue), LIGHT_INTENSITY)
        })
        .collect()
}

pub fn validate_light_count(requested: u32) -> RenderResult<()> {
    if requested > MAX_LIGHTS {
        return Err(RenderError::LightCountOutOfRange {
            requested,
            capacity: MAX_LIGHTS,
        });
    }
    Ok(())
}

pub struct LightStore {
    /// `LightSetHeader` followed by `MAX_LIGHTS` entries of `LightData`.
    pub light_set_buffer: wgpu::Buffer,
    time_buffer: wgpu::Buffer,
    move_lights_pipeline: wgpu::ComputePipeline,
    move_lights_bind_group: wgpu::BindGroup,
    num_lights: u32,
}

impl LightStore {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &ClusterConfig,
        num_lights: u32,
        seed: u64,
    ) -> RenderResult<Self> {
        validate_light_count(num_lights)?;

        let light_set_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Set"),
            size: light_set_size(),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let lights = initial_lights(seed);
        queue.write_buffer(
            &light_set_buffer,
            std::mem::size_of::<LightSetHeader>() as u64,
            bytemuck::cast_slice(&lights),
        );

        let time_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Time Uniforms"),
            size: std::mem::size_of::<TimeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bgl = pipeline::create_move_lights_bgl(device);
        let move_lights_pipeline = pipeline::create_move_lights_pipeline(device, config, &bgl);
        let move_lights_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Move Lights BG"),
            layout: &bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: light_set_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: time_buffer.as_entire_binding(),
                },
            ],
        });

        let mut store = Self {
            light_set_buffer,
            time_buffer,
            move_lights_pipeline,
            move_lights_bind_group,
            num_lights: 0,
        };
        store.set_light_count(queue, num_lights)?;
        log::info!("Light store created ({} of {} lights live)", num_lights, MAX_LIGHTS);
        Ok(store)
    }

    pub fn num_lights(&self) -> u32 {
        self.num_lights
    }

    /// Publishes a new live count. Light data is left untouched.
    pub fn set_light_count(&mut self, queue: &wgpu::Queue, num_lights: u32) -> RenderResult<()> {
        validate_light_count(num_lights)?;
        let header = LightSetHeader {
            num_lights,
            _pad: [0; 3],
        };
        queue.write_buffer(&self.light_set_buffer, 0, bytemuck::bytes_of(&header));
        self.num_lights = num_lights;
        log::debug!("Light count set to {}", num_lights);
        Ok(())
    }

    /// Overwrites entries `first..first + lights.len()`.
    pub fn write_lights(&self, queue: &wgpu::Queue, first: u32, lights: &[LightData]) -> RenderResult<()> {
        let end = first as u64 + lights.len() as u64;
        if end > MAX_LIGHTS as u64 {
            return Err(RenderError::LightCountOutOfRange {
                requested: end.min(u32::MAX as u64) as u32,
                capacity: MAX_LIGHTS,
            });
        }
        let offset = std::mem::size_of::<LightSetHeader>() as u64
            + first as u64 * std::mem::size_of::<LightData>() as u64;
        queue.write_buffer(&self.light_set_buffer, offset, bytemuck::cast_slice(lights));
        Ok(())
    }

    /// Moves the live lights to their positions at `seconds`. Encoded on its own
    /// command encoder and submitted immediately, so it lands on the queue
    /// ahead of the frame that clusters and shades with the new positions.
    pub fn animate(&self, device: &wgpu::Device, queue: &wgpu::Queue, seconds: f32) {
        let time = TimeUniforms {
            seconds,
            ..Default::default()
        };
        queue.write_buffer(&self.time_buffer, 0, bytemuck::bytes_of(&time));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Move Lights Encoder"),
        });
        let workgroups = self.num_lights.div_ceil(MOVE_LIGHTS_WORKGROUP_SIZE);
        if workgroups > 0 {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Move Lights Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.move_lights_pipeline);
            pass.set_bind_group(0, &self.move_lights_bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Reads the published count back from the GPU.
    pub fn read_num_lights(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> RenderResult<u32> {
        let bytes = readback::read_buffer(device, queue, &self.light_set_buffer, 0, 16)?;
        let header: LightSetHeader = bytemuck::pod_read_unaligned(&bytes);
        Ok(header.num_lights)
    }

    /// Reads the first `count` light entries back from the GPU.
    pub fn read_lights(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        count: u32,
    ) -> RenderResult<Vec<LightData>> {
        validate_light_count(count)?;
        let offset = std::mem::size_of::<LightSetHeader>() as u64;
        let size = count as u64 * std::mem::size_of::<LightData>() as u64;
        let bytes = readback::read_buffer(device, queue, &self.light_set_buffer, offset, size)?;
        Ok(bytes
            .chunks_exact(std::mem::size_of::<LightData>())
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }
}
