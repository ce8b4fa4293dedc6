//! Color types shared between client code and the 2D renderer.
//!
//! Geometry types remain in `coords`.

pub mod color;

pub use color::{Color, ColorAdd};
