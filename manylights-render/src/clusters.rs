//! Cluster builder: owns the cluster set buffer and the compute pass that
//! refills it every frame.

use manylights_gpu_shared::clustering::{ClusterConfig, ClusterGrid};
use manylights_gpu_shared::uniforms::{cluster_set_size, CanvasUniforms};
use wgpu::util::DeviceExt;

use crate::camera::CameraBuffer;
use crate::context::GpuContext;
use crate::error::{RenderError, RenderResult};
use crate::lights::LightStore;
use crate::pipeline;
use crate::readback;

pub struct ClusterBuilder {
    grid: ClusterGrid,
    config: ClusterConfig,
    /// `u32 numClusters` followed by `num_clusters` records of
    /// `{ count, indices[max_lights_per_cluster] }`.
    pub cluster_set_buffer: wgpu::Buffer,
    pub grid_buffer: wgpu::Buffer,
    pub canvas_buffer: wgpu::Buffer,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    workgroups: [u32; 3],
}

impl ClusterBuilder {
    /// Sizes the grid for the context's current canvas.
    pub fn new(
        gpu: &GpuContext,
        config: &ClusterConfig,
        lights: &LightStore,
        camera: &CameraBuffer,
    ) -> RenderResult<Self> {
        Self::for_canvas(gpu, gpu.width, gpu.height, config, lights, camera)
    }

    /// Sizes the grid for a `width` x `height` canvas, which need not be the
    /// context's current one.
    pub fn for_canvas(
        gpu: &GpuContext,
        width: u32,
        height: u32,
        config: &ClusterConfig,
        lights: &LightStore,
        camera: &CameraBuffer,
    ) -> RenderResult<Self> {
        let device = &gpu.device;
        let grid = ClusterGrid::new(width, height, config);
        let num_clusters = grid.num_clusters();
        let size = cluster_set_size(num_clusters, config.max_lights_per_cluster);
        gpu.check_storage_size("cluster set", size)?;

        let cluster_set_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cluster Set"),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        gpu.queue
            .write_buffer(&cluster_set_buffer, 0, bytemuck::bytes_of(&num_clusters));

        let grid_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cluster Grid Uniforms"),
            contents: bytemuck::bytes_of(&grid.uniforms()),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let canvas_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Canvas Uniforms"),
            contents: bytemuck::bytes_of(&CanvasUniforms::new(grid.width, grid.height)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bgl = pipeline::create_clustering_bgl(device);
        let pipeline = pipeline::create_clustering_pipeline(device, config, &bgl);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Clustering BG"),
            layout: &bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: lights.light_set_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: camera.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: canvas_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: grid_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: cluster_set_buffer.as_entire_binding(),
                },
            ],
        });

        let workgroups = grid.workgroups();
        log::info!(
            "Cluster grid {}x{}x{} ({} clusters, {} lights each, {} bytes), dispatch {:?}",
            grid.num_slices[0],
            grid.num_slices[1],
            grid.num_slices[2],
            num_clusters,
            config.max_lights_per_cluster,
            size,
            workgroups
        );

        Ok(Self {
            grid,
            config: *config,
            cluster_set_buffer,
            grid_buffer,
            canvas_buffer,
            pipeline,
            bind_group,
            workgroups,
        })
    }

    pub fn grid(&self) -> &ClusterGrid {
        &self.grid
    }

    /// Records the clustering pass. Must be the first pass of the frame's
    /// encoder so every shading pass after it sees this frame's assignments.
    pub fn build_clusters(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Clustering Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        let [x, y, z] = self.workgroups;
        pass.dispatch_workgroups(x, y, z);
    }

    /// Reads the whole cluster set back from the GPU.
    pub fn read_clusters(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> RenderResult<ClusterSnapshot> {
        let bytes = readback::read_buffer(
            device,
            queue,
            &self.cluster_set_buffer,
            0,
            self.cluster_set_buffer.size(),
        )?;
        ClusterSnapshot::from_bytes(&bytes, self.config.max_lights_per_cluster)
    }
}

/// Host copy of a cluster set buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterSnapshot {
    pub num_clusters: u32,
    pub max_lights_per_cluster: u32,
    words: Vec<u32>,
}

impl ClusterSnapshot {
    pub fn from_bytes(bytes: &[u8], max_lights_per_cluster: u32) -> RenderResult<Self> {
        if bytes.len() < 4 || bytes.len() % 4 != 0 {
            return Err(RenderError::readback(format!(
                "cluster set of {} bytes is malformed",
                bytes.len()
            )));
        }
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
        let num_clusters = words[0];
        let expected = cluster_set_size(num_clusters, max_lights_per_cluster) as usize / 4;
        if words.len() < expected {
            return Err(RenderError::readback(format!(
                "cluster set holds {} words, {} clusters need {}",
                words.len(),
                num_clusters,
                expected
            )));
        }
        Ok(Self {
            num_clusters,
            max_lights_per_cluster,
            words,
        })
    }

    fn record(&self, cluster: u32) -> &[u32] {
        assert!(
            cluster < self.num_clusters,
            "cluster {cluster} out of range (snapshot holds {} clusters)",
            self.num_clusters
        );
        let stride = 1 + self.max_lights_per_cluster as usize;
        let start = 1 + cluster as usize * stride;
        &self.words[start..start + stride]
    }

    /// Count as written by the kernel.
    pub fn count(&self, cluster: u32) -> u32 {
        self.record(cluster)[0]
    }

    /// Recorded light indices, in the order they were written.
    pub fn indices(&self, cluster: u32) -> &[u32] {
        let record = self.record(cluster);
        let count = (record[0] as usize).min(self.max_lights_per_cluster as usize);
        &record[1..1 + count]
    }

    pub fn non_empty(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.num_clusters).filter(|&c| self.count(c) > 0)
    }

    /// Raw words, header included.
    pub fn words(&self) -> &[u32] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(num_clusters: u32, max: u32, clusters: &[&[u32]]) -> Vec<u8> {
        let mut words = vec![num_clusters];
        for c in 0..num_clusters as usize {
            let list = clusters.get(c).copied().unwrap_or(&[]);
            words.push(list.len() as u32);
            for i in 0..max as usize {
                words.push(list.get(i).copied().unwrap_or(0xDEAD));
            }
        }
        bytemuck::cast_slice(&words).to_vec()
    }

    #[test]
    fn test_snapshot_parses_records() {
        let bytes = encode(3, 4, &[&[], &[2, 5], &[0, 1, 2, 3]]);
        let snap = ClusterSnapshot::from_bytes(&bytes, 4).unwrap();
        assert_eq!(snap.num_clusters, 3);
        assert_eq!(snap.count(0), 0);
        assert_eq!(snap.indices(1), &[2, 5]);
        assert_eq!(snap.indices(2), &[0, 1, 2, 3]);
        assert_eq!(snap.non_empty().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_snapshot_rejects_short_buffers() {
        let mut bytes = encode(3, 4, &[]);
        bytes.truncate(bytes.len() - 4);
        assert!(ClusterSnapshot::from_bytes(&bytes, 4).is_err());
        assert!(ClusterSnapshot::from_bytes(&[1, 2], 4).is_err());
    }

    #[test]
    #[should_panic(expected = "cluster 3 out of range")]
    fn test_cluster_past_the_end_is_rejected() {
        let bytes = encode(3, 4, &[]);
        let snap = ClusterSnapshot::from_bytes(&bytes, 4).unwrap();
        snap.indices(3);
    }

    #[test]
    fn test_indices_clamp_to_capacity() {
        let mut bytes = encode(1, 2, &[&[7, 8]]);
        // count beyond capacity must not read into the next record
        bytes[4..8].copy_from_slice(&9u32.to_le_bytes());
        let snap = ClusterSnapshot::from_bytes(&bytes, 2).unwrap();
        assert_eq!(snap.count(0), 9);
        assert_eq!(snap.indices(0), &[7, 8]);
    }
}
