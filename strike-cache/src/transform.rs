//! Contains a [`Transform`] object holding values of an affine transformation matrix.
use std::ops::Mul;

/// The device transform of a strike.
///
/// Factors are specified in column-order, meaning that
/// for a vector `(x,y)` the transformed position `x'` of the vector
/// is calculated by
/// `x' = xx * x + xy * y + dx`,
/// and the transformed position y' is calculated by
/// `y' = yx * x + yy * y + dy`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub xx: f32,
    pub yx: f32,
    pub xy: f32,
    pub yy: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self::scale(1.0);

    /// A uniform scale.
    pub const fn scale(factor: f32) -> Self {
        Self {
            xx: factor,
            yx: 0.0,
            xy: 0.0,
            yy: factor,
            dx: 0.0,
            dy: 0.0,
        }
    }

    pub fn rotation(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            xx: c,
            yx: s,
            xy: -s,
            yy: c,
            dx: 0.0,
            dy: 0.0,
        }
    }

    /// Returns `true` if this is at most a translation combined with a
    /// positive uniform scale: no flip, shear, rotation or differing axis
    /// scales.
    pub fn is_simple(&self) -> bool {
        self.yx == 0.0 && self.xy == 0.0 && self.xx == self.yy && self.xx > 0.0
    }

    /// The largest magnitude among the four matrix factors.
    pub fn max_scale_component(&self) -> f32 {
        [self.xx, self.yx, self.xy, self.yy]
            .into_iter()
            .map(f32::abs)
            .fold(0.0, f32::max)
    }
}

impl Mul for Transform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        fn muladdmul(a: f32, b: f32, c: f32, d: f32) -> f32 {
            a * b + c * d
        }
        Self {
            xx: muladdmul(self.xx, rhs.xx, self.xy, rhs.yx),
            xy: muladdmul(self.xx, rhs.xy, self.xy, rhs.yy),
            dx: muladdmul(self.xx, rhs.dx, self.xy, rhs.dy) + self.dx,
            yx: muladdmul(self.yx, rhs.xx, self.yy, rhs.yx),
            yy: muladdmul(self.yx, rhs.xy, self.yy, rhs.yy),
            dy: muladdmul(self.yx, rhs.dx, self.yy, rhs.dy) + self.dy,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
