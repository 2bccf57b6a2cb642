//! Indexed triangle meshes with flat per-face colors
use std::collections::HashMap;

use crate::buffer::Color;
use crate::error::MeshError;
use crate::math::Vector3;

/// Immutable vertex, face and color buffers.
///
/// Faces index into `vertices` and are wound counter-clockwise when seen
/// from the side they face. `colors[i]` is the flat color of `faces[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vector3>,
    faces: Vec<[usize; 3]>,
    colors: Vec<Color>,
}

impl Mesh {
    /// Build a mesh, checking that there is one color per face and that
    /// every face index refers to an existing vertex.
    pub fn new(
        vertices: Vec<Vector3>,
        faces: Vec<[usize; 3]>,
        colors: Vec<Color>,
    ) -> Result<Self, MeshError> {
        if faces.len() != colors.len() {
            return Err(MeshError::FaceColorMismatch {
                faces: faces.len(),
                colors: colors.len(),
            });
        }

        for (face, indices) in faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i >= vertices.len()) {
                return Err(MeshError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }

        Ok(Self {
            vertices,
            faces,
            colors,
        })
    }

    /// Build an indexed mesh from loose triangles, merging vertices with
    /// bit-identical coordinates. Every face gets `color`.
    pub fn from_triangles(triangles: &[[Vector3; 3]], color: Color) -> Self {
        let mut lookup: HashMap<[u32; 3], usize> = HashMap::new();
        let mut vertices = Vec::new();
        let mut faces = Vec::with_capacity(triangles.len());

        for triangle in triangles {
            let mut face = [0usize; 3];
            for (slot, vertex) in face.iter_mut().zip(triangle) {
                let key = [vertex.x.to_bits(), vertex.y.to_bits(), vertex.z.to_bits()];
                *slot = *lookup.entry(key).or_insert_with(|| {
                    vertices.push(*vertex);
                    vertices.len() - 1
                });
            }
            faces.push(face);
        }

        let colors = vec![color; faces.len()];
        Self {
            vertices,
            faces,
            colors,
        }
    }

    /// Axis-aligned cube centred on the origin with edge length `size`.
    /// Each side is two triangles sharing one color.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let vertices = vec![
            Vector3::new(-h, -h, -h),
            Vector3::new(h, -h, -h),
            Vector3::new(h, h, -h),
            Vector3::new(-h, h, -h),
            Vector3::new(-h, -h, h),
            Vector3::new(h, -h, h),
            Vector3::new(h, h, h),
            Vector3::new(-h, h, h),
        ];

        let sides: [([[usize; 3]; 2], Color); 6] = [
            // Back (z = -h)
            ([[0, 2, 1], [0, 3, 2]], Color::RED),
            // Front (z = +h)
            ([[5, 7, 4], [5, 6, 7]], Color::GREEN),
            // Left (x = -h)
            ([[4, 3, 0], [4, 7, 3]], Color::BLUE),
            // Right (x = +h)
            ([[1, 6, 5], [1, 2, 6]], Color::YELLOW),
            // Bottom (y = -h)
            ([[4, 1, 5], [4, 0, 1]], Color::MAGENTA),
            // Top (y = +h)
            ([[3, 6, 2], [3, 7, 6]], Color::CYAN),
        ];

        let mut faces = Vec::with_capacity(12);
        let mut colors = Vec::with_capacity(12);
        for (pair, color) in sides {
            faces.extend(pair);
            colors.extend([color, color]);
        }

        Self {
            vertices,
            faces,
            colors,
        }
    }

    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Vertex positions of face `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.face_count()`.
    pub fn triangle(&self, index: usize) -> [Vector3; 3] {
        let [a, b, c] = self.faces[index];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Iterate faces as `(positions, color)`
    pub fn triangles(&self) -> impl Iterator<Item = ([Vector3; 3], Color)> + '_ {
        (0..self.faces.len()).map(move |i| (self.triangle(i), self.colors[i]))
    }

    /// Axis-aligned `(min, max)` corners, `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<(Vector3, Vector3)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                Vector3::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
                Vector3::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
            )
        }))
    }

    /// Unit normal of face `index` following its winding
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.face_count()`.
    pub fn face_normal(&self, index: usize) -> Vector3 {
        let [v0, v1, v2] = self.triangle(index);
        (v1 - v0).cross(v2 - v0).normalized()
    }
}
