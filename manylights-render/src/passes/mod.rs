//! Render pass encoders for the three strategies.

pub mod forward;
pub mod gbuffer;
pub mod resolve;

use manylights_gpu_shared::uniforms::CLEAR_COLOR;

use crate::scene::{GpuMaterial, GpuNode, GpuPrimitive, SceneProvider, SceneVisitor};

/// Clear color of every color target that shows background.
pub fn clear_color() -> wgpu::Color {
    let [r, g, b] = CLEAR_COLOR.map(f64::from);
    wgpu::Color { r, g, b, a: 1.0 }
}

/// Binds node (group 1) and material (group 2) as they are visited and draws
/// each primitive.
pub struct DrawVisitor<'p, 'e> {
    pass: &'p mut wgpu::RenderPass<'e>,
    pub draw_calls: u32,
}

impl<'p, 'e> DrawVisitor<'p, 'e> {
    pub fn new(pass: &'p mut wgpu::RenderPass<'e>) -> Self {
        Self {
            pass,
            draw_calls: 0,
        }
    }
}

impl SceneVisitor for DrawVisitor<'_, '_> {
    fn node(&mut self, node: &GpuNode) {
        self.pass.set_bind_group(1, &node.bind_group, &[]);
    }

    fn material(&mut self, material: &GpuMaterial) {
        self.pass.set_bind_group(2, &material.bind_group, &[]);
    }

    fn primitive(&mut self, primitive: &GpuPrimitive) {
        self.pass
            .set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
        self.pass
            .set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.pass.draw_indexed(0..primitive.index_count, 0, 0..1);
        self.draw_calls += 1;
    }
}

/// Draws every primitive of `scene` into an already configured pass.
pub fn draw_scene(pass: &mut wgpu::RenderPass<'_>, scene: &dyn SceneProvider) -> u32 {
    let mut visitor = DrawVisitor::new(pass);
    scene.iterate(&mut visitor);
    visitor.draw_calls
}
