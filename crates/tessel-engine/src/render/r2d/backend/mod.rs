//! Consumers of a recorded 2D command list.

use core::ops::Range;

use crate::coords::{Mat3x2, PixelRect};
use crate::paint::{Color, ColorAdd};

use super::state::{BlendState, PixelShaderId, RasterizerState, SamplerState, VertexShaderId};
use super::vertex_buffer::VertexBatch;

pub mod gpu;

pub use gpu::WgpuRenderer2D;

/// Receives commands from [`Renderer2D::replay`](super::Renderer2D::replay) in record order.
///
/// Every state callback carries the full value that is in effect from then on.
pub trait Renderer2DBackend {
    /// Rebind the engine vertex/index buffers.
    fn set_buffers(&mut self);

    /// Subsequent draws read from `batch`.
    fn update_buffers(&mut self, batch_index: u32, batch: &VertexBatch);

    fn set_color_mul(&mut self, color: &Color);
    fn set_color_add(&mut self, color: &ColorAdd);
    fn set_blend_state(&mut self, state: &BlendState);
    fn set_rasterizer_state(&mut self, state: &RasterizerState);
    fn set_vs_sampler_state(&mut self, slot: usize, state: &SamplerState);
    fn set_ps_sampler_state(&mut self, slot: usize, state: &SamplerState);

    /// `None` means the whole target.
    fn set_scissor_rect(&mut self, rect: Option<PixelRect>);

    /// `None` means the whole target.
    fn set_viewport(&mut self, viewport: Option<PixelRect>);

    fn set_vertex_shader(&mut self, id: VertexShaderId);
    fn set_pixel_shader(&mut self, id: PixelShaderId);

    /// Combined (local × camera) transform.
    fn set_transform(&mut self, transform: &Mat3x2);

    /// Draw `indices` of the batch last passed to `update_buffers`.
    fn draw(&mut self, batch_index: u32, indices: Range<u32>);
}
