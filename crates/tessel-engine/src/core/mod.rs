//! Contracts between the runtime loop and applications.
//!
//! The runtime owns windows and their [`Engine`]s; applications see them only
//! through the per-frame [`FrameCtx`].

mod app;
mod ctx;
mod engine;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
pub use engine::{Engine, EngineConfig};
