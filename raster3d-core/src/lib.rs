//! raster3d core library - software 3D rendering without a GPU
//!
//! Vector, matrix and quaternion algebra, a scene graph with SRT
//! transforms, a look-at/perspective camera and an edge-function triangle
//! rasterizer with a depth buffer. Presentation (windows, terminals) lives
//! outside this crate and hands in a [`FrameBuffer`] each frame.

pub mod buffer;
pub mod camera;
pub mod error;
pub mod math;
pub mod mesh;
pub mod pipeline;
pub mod rasterizer;
pub mod scene;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use buffer::{Color, FrameBuffer};
pub use camera::Camera;
pub use error::{MeshError, StlError};
pub use math::{Matrix4, Quaternion, Vector3};
pub use mesh::Mesh;
pub use pipeline::{FrameStats, RenderOptions, Renderer, Spin, Wireframe};
pub use rasterizer::Rasterizer;
pub use scene::SceneNode;
pub use transform::Transform;
