//! The scene the viewer renders: a checkered floor with a grid of pillars,
//! inside the box the lights move in, seen from an orbiting camera.

use glam::{Mat4, Quat, Vec3};
use manylights_render::camera::{Camera, Orbit};
use manylights_render::mesh::MeshData;
use manylights_render::scene::{checker_texture, solid_texture, Scene, SceneBuilder, SceneLayouts};

const FLOOR_SIZE: f32 = 30.0;
const PILLAR_SPACING: f32 = 6.0;
const PILLAR_HEIGHT: f32 = 6.0;

pub fn build_scene(device: &wgpu::Device, queue: &wgpu::Queue, layouts: &SceneLayouts) -> Scene {
    let mut builder = SceneBuilder::new(device, queue, layouts);

    let floor_mesh = builder.add_mesh("Floor", &MeshData::plane(FLOOR_SIZE, 6.0));
    let cube_mesh = builder.add_mesh("Pillar", &MeshData::cube(1.0));
    let floor_mat = builder.add_material(
        "Floor Checker",
        &checker_texture(256, 8, [200, 200, 200], [90, 90, 90]),
    );
    let pillar_mat = builder.add_material("Pillar Stone", &solid_texture([180, 170, 150]));

    builder.add_node(Mat4::IDENTITY, &[(floor_mat, floor_mesh)]);

    // 4x4 pillars, centred on the origin
    for i in 0..4 {
        for j in 0..4 {
            let x = (i as f32 - 1.5) * PILLAR_SPACING;
            let z = (j as f32 - 1.5) * PILLAR_SPACING;
            let transform = Mat4::from_scale_rotation_translation(
                Vec3::new(1.0, PILLAR_HEIGHT, 1.0),
                Quat::from_rotation_y(0.3 * (i + j) as f32),
                Vec3::new(x, PILLAR_HEIGHT * 0.5, z),
            );
            builder.add_node(transform, &[(pillar_mat, cube_mesh)]);
        }
    }

    builder.build()
}

pub fn orbit_camera(width: u32, height: u32) -> Camera {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    Camera::looking_at(Vec3::new(18.0, 7.0, 0.0), Vec3::new(0.0, 1.0, 0.0), aspect).with_orbit(
        Orbit {
            radius: 18.0,
            height: 7.0,
            speed: 0.1,
            angle: 0.0,
        },
    )
}
