//! Vector, matrix and quaternion algebra
mod matrix;
mod quaternion;
mod vector;

pub use matrix::Matrix4;
pub use quaternion::Quaternion;
pub use vector::Vector3;
