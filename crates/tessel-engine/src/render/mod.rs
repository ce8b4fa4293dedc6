//! GPU rendering subsystem.
//!
//! Renderers record work on the CPU and issue GPU commands via wgpu. Each
//! backend owns its GPU resources (pipelines, buffers, samplers).

mod ctx;
pub mod r2d;

pub use ctx::{RenderCtx, RenderTarget};
