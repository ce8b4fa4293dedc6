//! Immediate-mode 2D renderer.
//!
//! Shape calls are tessellated on the CPU into 16-bit indexed vertex batches,
//! and state changes are recorded as a coalesced command list. A backend then
//! replays the list against a graphics API.
//!
//! Convention:
//! - Geometry is in logical pixels (top-left origin, +Y down).
//! - Transforms are row-vector 3x2 matrices; `a * b` applies `a` first.
//! - Scissor rects and viewports are in physical pixels.

pub mod backend;
pub mod builder;
pub mod command;
pub mod renderer;
pub mod state;
pub mod tracker;
pub mod vertex;
pub mod vertex_buffer;

pub use backend::{Renderer2DBackend, WgpuRenderer2D};
pub use builder::{BufferCreator, BufferSlot, LineStyle};
pub use command::{Command, CommandManager, CommandType, DrawCommand};
pub use renderer::Renderer2D;
pub use state::{
    Blend, BlendOp, BlendState, CullMode, FillMode, PixelShaderId, RasterizerState, SamplerState,
    TextureAddressMode, TextureFilter, VertexShaderId,
};
pub use tracker::{StateFlags, StateTracker};
pub use vertex::{IndexType, Vertex2D};
pub use vertex_buffer::{BatchWriter, Renderer2DConfig, VertexBatch, VertexBufferManager2D};
