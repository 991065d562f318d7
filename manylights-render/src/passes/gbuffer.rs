//! G-buffer geometry pass: world position, normal and albedo, no lighting.

use crate::render_targets::GBuffer;
use crate::scene::SceneProvider;

pub fn render_gbuffer_pass(
    encoder: &mut wgpu::CommandEncoder,
    gbuffer: &GBuffer,
    pipeline: &wgpu::RenderPipeline,
    camera_bg: &wgpu::BindGroup,
    scene: &dyn SceneProvider,
) {
    let attachment = |view| {
        Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                // position.w == 0 marks background for the resolve
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })
    };

    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("G-Buffer Pass"),
        color_attachments: &[
            attachment(&gbuffer.position_view),
            attachment(&gbuffer.normal_view),
            attachment(&gbuffer.albedo_view),
        ],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &gbuffer.depth.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        ..Default::default()
    });

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, camera_bg, &[]);
    super::draw_scene(&mut pass, scene);
}
