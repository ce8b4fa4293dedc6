use super::Mat3x2;

/// Render target size in logical pixels plus the logical → physical scale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale_factor: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        Self { width, height, scale_factor }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.scale_factor > 0.0
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// Physical size in whole pixels (at least 1x1).
    #[inline]
    pub fn physical_size(self) -> (u32, u32) {
        (
            (self.width * self.scale_factor).round().max(1.0) as u32,
            (self.height * self.scale_factor).round().max(1.0) as u32,
        )
    }

    /// Logical pixels → NDC for this viewport.
    #[inline]
    pub fn screen_matrix(self) -> Mat3x2 {
        Mat3x2::screen(self.width.max(1.0), self.height.max(1.0))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}
