//! Error types for mesh construction and STL import
use thiserror::Error;

/// Contract violations detected while building a [`Mesh`](crate::Mesh)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh has {faces} faces but {colors} colors; one color per face is required")]
    FaceColorMismatch { faces: usize, colors: usize },

    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },
}

/// Errors raised while parsing STL data
#[derive(Error, Debug)]
pub enum StlError {
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooShort(usize),

    #[error("unexpected end of file: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("failed to parse ASCII STL: {0}")]
    Ascii(String),

    #[error("failed to read STL file: {0}")]
    Io(#[from] std::io::Error),
}
