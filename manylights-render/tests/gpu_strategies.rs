//! Each strategy rendered offscreen against the same scene and lights.

mod common;

use std::f32::consts::FRAC_PI_2;
use std::panic::{catch_unwind, AssertUnwindSafe};

use glam::{Mat4, Vec3};
use manylights_gpu_shared::uniforms::{LightData, LIGHT_INTENSITY};
use manylights_render::frame_loop::FrameTime;
use manylights_render::mesh::MeshData;
use manylights_render::readback::read_texture_rgba8;
use manylights_render::render_targets::{
    DEPTH_FORMAT, GBUFFER_ALBEDO_FORMAT, GBUFFER_NORMAL_FORMAT, GBUFFER_POSITION_FORMAT,
};
use manylights_render::renderers::create_renderer;
use manylights_render::scene::{solid_texture, SceneBuilder, SceneLayouts};
use manylights_render::{RenderError, RenderMode, RendererConfig, RendererSlot, Stage};

use common::{create_gpu, origin_camera, CANVAS};

/// White wall five units in front of the origin camera, filling the view, lit
/// by three lights just in front of it.
fn create_wall_stage(test: &str) -> Option<Stage> {
    let gpu = create_gpu(test)?;
    let layouts = SceneLayouts::new(&gpu.device);
    let scene = {
        let mut builder = SceneBuilder::new(&gpu.device, &gpu.queue, &layouts);
        let wall = builder.add_mesh("Wall", &MeshData::plane(20.0, 1.0));
        let white = builder.add_material("White", &solid_texture([255, 255, 255]));
        let transform =
            Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)) * Mat4::from_rotation_x(FRAC_PI_2);
        builder.add_node(transform, &[(white, wall)]);
        builder.build()
    };
    let config = RendererConfig::default().with_num_lights(0);
    let mut stage = Stage::new(gpu, layouts, scene, origin_camera(), config).expect("stage");

    let lights = [
        LightData::new([0.0, 0.0, -4.5], [1.0, 1.0, 1.0], LIGHT_INTENSITY),
        LightData::new([1.5, 1.0, -4.2], [1.0, 0.2, 0.2], LIGHT_INTENSITY),
        LightData::new([-1.2, -0.8, -4.6], [0.2, 0.2, 1.0], LIGHT_INTENSITY),
    ];
    stage
        .lights
        .write_lights(&stage.gpu.queue, 0, &lights)
        .unwrap();
    stage.set_light_count(lights.len() as u32).unwrap();
    Some(stage)
}

fn render(stage: &mut Stage, mode: RenderMode) -> Vec<u8> {
    let texture = stage.gpu.create_offscreen_target();
    stage.target = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
    let mut renderer = create_renderer(mode, stage).unwrap();
    assert_eq!(renderer.mode(), mode);
    renderer.draw(stage).unwrap();
    stage.target = None;
    read_texture_rgba8(&stage.gpu.device, &stage.gpu.queue, &texture).unwrap()
}

fn max_channel_diff(a: &[u8], b: &[u8]) -> u8 {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.abs_diff(*y))
        .max()
        .unwrap_or(0)
}

fn pixel(image: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * CANVAS + x) * 4) as usize;
    [image[i], image[i + 1], image[i + 2], image[i + 3]]
}

#[test]
fn test_all_strategies_agree_on_lit_wall() {
    let Some(mut stage) = create_wall_stage("test_all_strategies_agree_on_lit_wall") else {
        return;
    };
    let naive = render(&mut stage, RenderMode::Naive);
    let forward_plus = render(&mut stage, RenderMode::ForwardPlus);
    let deferred = render(&mut stage, RenderMode::ClusteredDeferred);

    assert_eq!(naive.len(), (CANVAS * CANVAS * 4) as usize);
    let center = pixel(&naive, CANVAS / 2, CANVAS / 2);
    let corner = pixel(&naive, 0, 0);
    assert!(center[0] > corner[0] + 32, "center {center:?} corner {corner:?}");

    assert!(max_channel_diff(&naive, &forward_plus) <= 2);
    assert!(max_channel_diff(&forward_plus, &deferred) <= 2);
}

#[test]
fn test_draw_without_target_fails() {
    let Some(mut stage) = create_wall_stage("test_draw_without_target_fails") else {
        return;
    };
    for mode in RenderMode::ALL {
        let mut renderer = create_renderer(mode, &stage).unwrap();
        let err = renderer.draw(&mut stage).unwrap_err();
        assert!(matches!(err, RenderError::NoTarget));
    }
}

#[test]
fn test_strategies_follow_resize() {
    let Some(mut stage) = create_wall_stage("test_strategies_follow_resize") else {
        return;
    };
    let mut renderers: Vec<_> = RenderMode::ALL
        .iter()
        .map(|&mode| create_renderer(mode, &stage).unwrap())
        .collect();

    stage.resize(320, 200).unwrap();
    assert_eq!(stage.generation(), 1);
    assert!(stage.clusters.grid().matches_canvas(320, 200));
    assert_eq!(stage.clusters.grid().num_slices, [5, 4, 24]);

    let texture = stage.gpu.create_offscreen_target();
    stage.target = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
    for renderer in &mut renderers {
        renderer.draw(&mut stage).unwrap();
    }
    let image = read_texture_rgba8(&stage.gpu.device, &stage.gpu.queue, &texture).unwrap();
    assert_eq!(image.len(), 320 * 200 * 4);
}

#[test]
fn test_slot_swaps_between_real_strategies() {
    let Some(mut stage) = create_wall_stage("test_slot_swaps_between_real_strategies") else {
        return;
    };
    let texture = stage.gpu.create_offscreen_target();
    stage.target = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));

    let mut slot = RendererSlot::new();
    slot.set_on_frame(|stage: &mut Stage, time: FrameTime| stage.advance(time));

    let mut now = 0.0;
    for mode in [
        RenderMode::ClusteredDeferred,
        RenderMode::Naive,
        RenderMode::ForwardPlus,
    ] {
        let installed = slot.set_strategy(|| create_renderer(mode, &stage)).unwrap();
        assert_eq!(installed, mode);
        assert_eq!(slot.mode(), Some(mode));
        for _ in 0..2 {
            now += 0.016;
            assert!(slot.run_frame(&mut stage, now).unwrap());
        }
    }
    assert_eq!(slot.frame_loop().starts(), 3);
    assert_eq!(slot.frame_loop().stops(), 2);
}

#[test]
fn test_gbuffer_formats_render_on_adapter() {
    let Some(gpu) = create_gpu("test_gbuffer_formats_render_on_adapter") else {
        return;
    };
    for format in [
        GBUFFER_POSITION_FORMAT,
        GBUFFER_NORMAL_FORMAT,
        GBUFFER_ALBEDO_FORMAT,
        DEPTH_FORMAT,
    ] {
        let features = gpu.adapter.get_texture_format_features(format);
        assert!(
            features
                .allowed_usages
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT),
            "{format:?} is not renderable on {}",
            gpu.adapter.get_info().name
        );
    }
}

#[test]
fn test_failed_resize_keeps_previous_canvas() {
    let Some(mut stage) = create_wall_stage("test_failed_resize_keeps_previous_canvas") else {
        return;
    };
    let aspect = stage.camera.aspect;

    // far past any storage binding limit
    let err = stage.resize(65536, 65536).unwrap_err();
    assert!(matches!(err, RenderError::Limits(_)), "{err}");
    assert_eq!((stage.width(), stage.height()), (CANVAS, CANVAS));
    assert!(stage.clusters.grid().matches_canvas(CANVAS, CANVAS));
    assert_eq!(stage.generation(), 0);
    assert_eq!(stage.camera.aspect, aspect);

    let image = render(&mut stage, RenderMode::ForwardPlus);
    assert_eq!(image.len(), (CANVAS * CANVAS * 4) as usize);
}

#[cfg(debug_assertions)]
#[test]
fn test_stale_grid_is_caught_before_drawing() {
    let Some(mut stage) = create_wall_stage("test_stale_grid_is_caught_before_drawing") else {
        return;
    };
    let mut renderer = create_renderer(RenderMode::ForwardPlus, &stage).unwrap();
    // canvas changes without the stage rebuilding its grid
    stage.gpu.resize(320, 200);

    let result = catch_unwind(AssertUnwindSafe(|| renderer.draw(&mut stage)));
    assert!(result.is_err(), "drawing with a stale cluster grid must panic");
}
