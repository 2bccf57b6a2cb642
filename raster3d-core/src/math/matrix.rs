//! 4x4 homogeneous transformation matrices
use approx::{AbsDiffEq, RelativeEq};
use std::ops::Mul;

use super::Vector3;

/// Row-major 4x4 matrix, `m[row][col]`.
///
/// Points are treated as column vectors, so `a * b` applies `b` first and
/// translation lives in the last column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    pub m: [[f32; 4]; 4],
}

impl Matrix4 {
    pub const fn new(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    pub const fn identity() -> Self {
        Self::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut out = Self::identity();
        out.m[0][3] = x;
        out.m[1][3] = y;
        out.m[2][3] = z;
        out
    }

    /// Axis-aligned scale
    pub fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        let mut out = Self::identity();
        out.m[0][0] = sx;
        out.m[1][1] = sy;
        out.m[2][2] = sz;
        out
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, -s, 0.0],
            [0.0, s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Right-handed perspective projection mapping view-space depth into
    /// the OpenGL clip range [-1, 1].
    ///
    /// The camera looks down -Z and `w' = -z`, so points with `z >= 0`
    /// project degenerately and must be rejected before the divide.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y / 2.0).tan();
        let a = (far + near) / (near - far);
        let b = (2.0 * far * near) / (near - far);
        Self::new([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, a, b],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    pub fn transpose(&self) -> Self {
        let mut out = [[0.0; 4]; 4];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.m[c][r];
            }
        }
        Self::new(out)
    }

    /// Multiply `(x, y, z, 1)` by this matrix and apply the perspective
    /// divide. The divide is skipped when `w` is exactly 0 or 1, which keeps
    /// affine transforms exact.
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        let [x, y, z, w] = self.mul_vec4([p.x, p.y, p.z, 1.0]);
        if w != 0.0 && w != 1.0 {
            Vector3::new(x / w, y / w, z / w)
        } else {
            Vector3::new(x, y, z)
        }
    }

    /// Transform a direction (`w = 0`): translation is ignored and no
    /// divide happens.
    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        let [x, y, z, _] = self.mul_vec4([v.x, v.y, v.z, 0.0]);
        Vector3::new(x, y, z)
    }

    pub fn mul_vec4(&self, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (r, value) in out.iter_mut().enumerate() {
            let row = &self.m[r];
            *value = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3] * v[3];
        }
        out
    }

    /// Translation column
    pub fn translation_part(&self) -> Vector3 {
        Vector3::new(self.m[0][3], self.m[1][3], self.m[2][3])
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[[f32; 4]; 4]> for Matrix4 {
    fn from(m: [[f32; 4]; 4]) -> Self {
        Self::new(m)
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        &self * &rhs
    }
}

impl<'a> Mul<&'a Matrix4> for &'a Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: &'a Matrix4) -> Matrix4 {
        let mut out = [[0.0; 4]; 4];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.m[r][k] * rhs.m[k][c]).sum();
            }
        }
        Matrix4::new(out)
    }
}

impl AbsDiffEq for Matrix4 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl RelativeEq for Matrix4 {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}
