use core::ops::Mul;

use super::Vec2;

/// 2D affine transform stored as a 3x2 matrix in row-vector convention.
///
/// A point `p` maps to `(p.x * m11 + p.y * m21 + m31, p.x * m12 + p.y * m22 + m32)`.
/// `a * b` applies `a` first, then `b`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat3x2 {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub m31: f32,
    pub m32: f32,
}

impl Mat3x2 {
    pub const IDENTITY: Mat3x2 = Mat3x2::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    #[inline]
    pub const fn new(m11: f32, m12: f32, m21: f32, m22: f32, m31: f32, m32: f32) -> Self {
        Self { m11, m12, m21, m22, m31, m32 }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub const fn translate(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    #[inline]
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Uniform scale around `center`.
    #[inline]
    pub fn scale_at(s: f32, center: Vec2) -> Self {
        Self::new(s, 0.0, 0.0, s, center.x - s * center.x, center.y - s * center.y)
    }

    /// Clockwise rotation (in a +Y down space) by `angle` radians around the origin.
    #[inline]
    pub fn rotate(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// Maps logical pixels in a `width` x `height` viewport to normalized device coordinates.
    #[inline]
    pub fn screen(width: f32, height: f32) -> Self {
        Self::new(2.0 / width, 0.0, 0.0, -2.0 / height, -1.0, 1.0)
    }

    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x * self.m11 + p.y * self.m21 + self.m31,
            p.x * self.m12 + p.y * self.m22 + self.m32,
        )
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        [self.m11, self.m12, self.m21, self.m22, self.m31, self.m32]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Largest axis scale factor, approximated from the transformed unit diagonal.
    #[inline]
    pub fn max_scaling(&self) -> f32 {
        Vec2::new(self.m11 + self.m21, self.m12 + self.m22).length() / core::f32::consts::SQRT_2
    }

    /// Column-major rows for the shader (`dot(vec3(p, 1), row)` per output axis).
    #[inline]
    pub fn to_rows(&self) -> [[f32; 4]; 2] {
        [
            [self.m11, self.m21, self.m31, 0.0],
            [self.m12, self.m22, self.m32, 0.0],
        ]
    }
}

impl Default for Mat3x2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat3x2 {
    type Output = Mat3x2;

    #[inline]
    fn mul(self, b: Mat3x2) -> Mat3x2 {
        let a = self;
        Mat3x2::new(
            a.m11 * b.m11 + a.m12 * b.m21,
            a.m11 * b.m12 + a.m12 * b.m22,
            a.m21 * b.m11 + a.m22 * b.m21,
            a.m21 * b.m12 + a.m22 * b.m22,
            a.m31 * b.m11 + a.m32 * b.m21 + b.m31,
            a.m31 * b.m12 + a.m32 * b.m22 + b.m32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn identity_is_neutral() {
        let m = Mat3x2::translate(3.0, 4.0) * Mat3x2::scale(2.0, 2.0);
        assert_eq!(Mat3x2::IDENTITY * m, m);
        assert_eq!(m * Mat3x2::IDENTITY, m);
    }

    #[test]
    fn product_applies_left_operand_first() {
        // translate then scale: (1, 1) -> (11, 1) -> (22, 2)
        let m = Mat3x2::translate(10.0, 0.0) * Mat3x2::scale(2.0, 2.0);
        assert!(approx(m.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(22.0, 2.0)));

        // scale then translate: (1, 1) -> (2, 2) -> (12, 2)
        let m = Mat3x2::scale(2.0, 2.0) * Mat3x2::translate(10.0, 0.0);
        assert!(approx(m.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 2.0)));
    }

    #[test]
    fn rotate_quarter_turn() {
        let m = Mat3x2::rotate(core::f32::consts::FRAC_PI_2);
        assert!(approx(m.transform_point(Vec2::new(1.0, 0.0)), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn max_scaling_of_uniform_scale() {
        assert!((Mat3x2::IDENTITY.max_scaling() - 1.0).abs() < 1e-6);
        assert!((Mat3x2::scale(3.0, 3.0).max_scaling() - 3.0).abs() < 1e-5);
        assert!((Mat3x2::translate(50.0, -7.0).max_scaling() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn screen_maps_corners_to_ndc() {
        let m = Mat3x2::screen(200.0, 100.0);
        assert!(approx(m.transform_point(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0)));
        assert!(approx(m.transform_point(Vec2::new(200.0, 100.0)), Vec2::new(1.0, -1.0)));
    }
}
