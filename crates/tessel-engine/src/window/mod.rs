//! Window and event loop.
//!
//! Owns the `winit` event loop and windows; each window gets its own GPU
//! surface and [`Engine`](crate::core::Engine).

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
