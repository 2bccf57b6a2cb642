//! Rotation quaternions
use approx::{AbsDiffEq, RelativeEq};
use std::fmt;
use std::ops::Mul;

use super::{Matrix4, Vector3};

/// `w + xi + yj + zk`
///
/// Only [`Quaternion::from_axis_angle`] guarantees a unit result. The
/// Hamilton product does not renormalize; callers composing rotations over
/// many frames should call [`Quaternion::normalized`] themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Rotation of `angle_degrees` around `axis`. The axis does not need to
    /// be unit length.
    pub fn from_axis_angle(axis: Vector3, angle_degrees: f32) -> Self {
        Self::from_axis_angle_radians(axis, angle_degrees.to_radians())
    }

    pub fn from_axis_angle_radians(axis: Vector3, angle: f32) -> Self {
        let (s, c) = (angle / 2.0).sin_cos();
        let axis = axis.normalized();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s).normalized()
    }

    /// Rotation by `x`, then `y`, then `z` radians about the fixed axes.
    pub fn from_euler(x: f32, y: f32, z: f32) -> Self {
        let (sx, cx) = (x / 2.0).sin_cos();
        let (sy, cy) = (y / 2.0).sin_cos();
        let (sz, cz) = (z / 2.0).sin_cos();
        let qx = Self::new(cx, sx, 0.0, 0.0);
        let qy = Self::new(cy, 0.0, sy, 0.0);
        let qz = Self::new(cz, 0.0, 0.0, sz);
        qz * (qy * qx)
    }

    pub fn norm(&self) -> f32 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Divide by the norm. Must not be called on the zero quaternion.
    pub fn normalized(&self) -> Self {
        let norm = self.norm();
        Self::new(self.w / norm, self.x / norm, self.y / norm, self.z / norm)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotation matrix equivalent to conjugation by this quaternion. Only
    /// orthogonal when the quaternion is unit length.
    pub fn to_matrix4(&self) -> Matrix4 {
        let Self { w, x, y, z } = *self;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        Matrix4::new([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy), 0.0],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx), 0.0],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// `q · (0, v) · q*`, which assumes `q` is unit length.
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let pure = Self::new(0.0, v.x, v.y, v.z);
        let rotated = *self * pure * self.conjugate();
        Vector3::new(rotated.x, rotated.y, rotated.z)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton product
impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        let (w1, x1, y1, z1) = (self.w, self.x, self.y, self.z);
        let (w2, x2, y2, z2) = (other.w, other.x, other.y, other.z);
        Self::new(
            w1 * w2 - x1 * x2 - y1 * y2 - z1 * z2,
            w1 * x2 + x1 * w2 + y1 * z2 - z1 * y2,
            w1 * y2 - x1 * z2 + y1 * w2 + z1 * x2,
            w1 * z2 + x1 * y2 - y1 * x2 + z1 * w2,
        )
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quaternion(w={:.3}, x={:.3}, y={:.3}, z={:.3})",
            self.w, self.x, self.y, self.z
        )
    }
}

impl AbsDiffEq for Quaternion {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.w.abs_diff_eq(&other.w, epsilon)
            && self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
    }
}

impl RelativeEq for Quaternion {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.w.relative_eq(&other.w, epsilon, max_relative)
            && self.x.relative_eq(&other.x, epsilon, max_relative)
            && self.y.relative_eq(&other.y, epsilon, max_relative)
            && self.z.relative_eq(&other.z, epsilon, max_relative)
    }
}
