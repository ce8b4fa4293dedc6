//! GPU device and surface management.
//!
//! - picks a wgpu backend/adapter and creates the Device/Queue
//! - creates and configures the window Surface
//! - acquires frames and maps surface errors to actions

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
