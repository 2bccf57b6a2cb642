//! Per-node position, rotation and scale
use crate::math::{Matrix4, Quaternion, Vector3};

/// Local placement of a scene node.
///
/// The matrix is rebuilt on every call to [`Transform::matrix`], so edits to
/// the public fields show up immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3,
    pub rotation: Quaternion,
    pub scale: Vector3,
}

impl Transform {
    pub fn new(position: Vector3, rotation: Quaternion, scale: Vector3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quaternion) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3) -> Self {
        self.scale = scale;
        self
    }

    /// Compose an incremental rotation on top of the current one and
    /// renormalize, so repeated per-frame updates don't drift off unit length.
    pub fn rotate(&mut self, delta: Quaternion) {
        self.rotation = (delta * self.rotation).normalized();
    }

    /// `T · R · S`: scale first, then rotation, then translation.
    pub fn matrix(&self) -> Matrix4 {
        let t = Matrix4::translation(self.position.x, self.position.y, self.position.z);
        let r = self.rotation.to_matrix4();
        let s = Matrix4::scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            rotation: Quaternion::identity(),
            scale: Vector3::ONE,
        }
    }
}
