//! Coordinate and geometry types shared across the engine.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! Transforms are row-vector `Mat3x2`; the 2D backend composes them with a
//! screen matrix to reach NDC.

mod mat3x2;
mod pixel_rect;
mod rect;
mod vec2;
mod viewport;

pub use mat3x2::Mat3x2;
pub use pixel_rect::PixelRect;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
