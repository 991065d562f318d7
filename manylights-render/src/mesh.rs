//! Vertex layout and the procedural meshes the demo scene is built from.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Interleaved vertex: position, normal, texture coordinate (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Appends a quad centred at `center` facing `normal`. `u` and `v` are the
    /// half-extent axes with `u x v` pointing along `normal`, so the quad is
    /// counter-clockwise seen from the front.
    fn push_quad(&mut self, center: Vec3, normal: Vec3, u: Vec3, v: Vec3, uv_scale: f32) {
        let base = self.vertices.len() as u32;
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        for (su, sv) in corners {
            let position = center + u * su + v * sv;
            self.vertices.push(Vertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv: [(su + 1.0) * 0.5 * uv_scale, (1.0 - sv) * 0.5 * uv_scale],
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Square in the XZ plane at `y = 0`, facing +Y, with the texture repeated
    /// `uv_repeat` times across it.
    pub fn plane(size: f32, uv_repeat: f32) -> Self {
        let mut mesh = Self::default();
        let half = size * 0.5;
        mesh.push_quad(
            Vec3::ZERO,
            Vec3::Y,
            Vec3::X * half,
            Vec3::NEG_Z * half,
            uv_repeat,
        );
        mesh
    }

    /// Axis-aligned cube with edge length `size`, 4 vertices per face.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let mut mesh = Self::default();
        for (normal, u, v) in faces {
            mesh.push_quad(normal * h, normal, u * h, v * h, 1.0);
        }
        mesh
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}
