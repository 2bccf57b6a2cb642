//! Pinhole camera: look-at view and perspective projection
use crate::math::{Matrix4, Vector3};

/// Camera configuration for 3D rendering
///
/// `fov` is the vertical field of view in radians. View and projection
/// matrices are derived on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vector3,
    pub target: Vector3,
    pub up: Vector3,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(
        position: Vector3,
        target: Vector3,
        up: Vector3,
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect,
            near,
            far,
        }
    }

    /// Camera at (0, 0, 5) looking at the origin, sized for a viewport.
    pub fn for_viewport(width: usize, height: usize) -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 5.0),
            target: Vector3::ZERO,
            up: Vector3::Y,
            fov: 60f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 100.0,
        }
    }

    /// World to camera space. The camera looks down -Z with +X right and
    /// +Y up; `up` only needs to be roughly perpendicular to the view
    /// direction.
    pub fn view_matrix(&self) -> Matrix4 {
        let forward = (self.target - self.position).normalized();
        let right = forward.cross(self.up).normalized();
        let true_up = right.cross(forward);
        let eye = self.position;

        Matrix4::new([
            [right.x, right.y, right.z, -right.dot(eye)],
            [true_up.x, true_up.y, true_up.z, -true_up.dot(eye)],
            [-forward.x, -forward.y, -forward.z, forward.dot(eye)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn projection_matrix(&self) -> Matrix4 {
        Matrix4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Project a view-space point to pixel coordinates.
    ///
    /// Returns `None` for points at or behind the near plane. `x` and `y`
    /// span `[0, width - 1]` and `[0, height - 1]` for points inside the
    /// frustum, with y growing downward; `z` is the NDC depth in [-1, 1].
    pub fn project_to_screen(&self, view: Vector3, width: usize, height: usize) -> Option<Vector3> {
        if view.z >= -self.near {
            return None;
        }

        let ndc = self.projection_matrix().transform_point(view);
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;

        Some(Vector3::new(
            (ndc.x * 0.5 + 0.5) * max_x,
            (1.0 - (ndc.y * 0.5 + 0.5)) * max_y,
            ndc.z,
        ))
    }

    /// Move the eye on a circle around the target in the XZ plane, keeping
    /// the current distance and height.
    pub fn orbit(&mut self, angle: f32) {
        let offset = self.position - self.target;
        let (s, c) = angle.sin_cos();
        let rotated = Vector3::new(offset.x * c + offset.z * s, offset.y, -offset.x * s + offset.z * c);
        self.position = self.target + rotated;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::for_viewport(800, 600)
    }
}
