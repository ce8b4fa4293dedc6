use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::paint::Color;

/// Index type used by 2D batches.
pub type IndexType = u16;

/// 2D vertex (32 bytes):
///
///  offset  0  pos    [f32; 2]   loc 0
///  offset  8  tex    [f32; 2]   loc 1
///  offset 16  color  [f32; 4]   loc 2
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex2D {
    pub pos: [f32; 2],
    pub tex: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2D {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2, // tex
        2 => Float32x4  // color
    ];

    #[inline]
    pub fn new(pos: Vec2, color: Color) -> Self {
        Self {
            pos: [pos.x, pos.y],
            tex: [0.0, 0.0],
            color: color.to_array(),
        }
    }

    #[inline]
    pub fn set(&mut self, pos: Vec2, color: Color) {
        *self = Self::new(pos, color);
    }

    #[inline]
    pub fn set_pos(&mut self, x: f32, y: f32) {
        self.pos = [x, y];
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.pos[0], self.pos[1])
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex2D>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}
