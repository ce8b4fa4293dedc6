//! Tessel engine crate.
//!
//! Immediate-mode 2D rendering: shapes are tessellated on the CPU, state
//! changes are recorded into a coalesced command list, and a wgpu backend
//! replays it. Also owns the window/GPU runtime that hosts it.

pub mod core;
pub mod device;
pub mod time;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;
pub mod render;
