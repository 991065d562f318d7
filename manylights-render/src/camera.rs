//! Camera provider: a perspective camera with an optional auto orbit, and the
//! uniform buffer every pass reads it from.

use glam::{Mat4, Vec3};
use manylights_gpu_shared::uniforms::CameraUniforms;

/// Circular path around the camera target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
    pub radius: f32,
    pub height: f32,
    /// Radians per second.
    pub speed: f32,
    pub angle: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub orbit: Option<Orbit>,
}

impl Camera {
    pub fn looking_at(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect,
            near: 0.1,
            far: 100.0,
            orbit: None,
        }
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self.place_on_orbit();
        self
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Advances the orbit by `delta` seconds.
    pub fn on_frame(&mut self, delta: f32) {
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.angle = (orbit.angle + orbit.speed * delta) % std::f32::consts::TAU;
            self.place_on_orbit();
        }
    }

    fn place_on_orbit(&mut self) {
        if let Some(orbit) = self.orbit {
            self.eye = self.target
                + Vec3::new(
                    orbit.angle.cos() * orbit.radius,
                    orbit.height,
                    orbit.angle.sin() * orbit.radius,
                );
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Right-handed perspective with a `[0, 1]` depth range.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn uniforms(&self) -> CameraUniforms {
        let view = self.view_matrix();
        let proj = self.projection();
        CameraUniforms {
            view_proj: (proj * view).to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            inv_proj: proj.inverse().to_cols_array_2d(),
            position: self.eye.extend(1.0).to_array(),
            near: self.near,
            far: self.far,
            _pad1: 0.0,
            _pad2: 0.0,
        }
    }
}

/// GPU copy of the camera, refreshed once per frame before any pass runs.
pub struct CameraBuffer {
    pub buffer: wgpu::Buffer,
}

impl CameraBuffer {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&camera.uniforms()));
    }
}
