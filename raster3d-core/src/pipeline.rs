//! Per-frame pipeline: scene traversal, culling, projection and rasterization
use log::trace;
use std::fmt;

use crate::buffer::{Color, FrameBuffer};
use crate::camera::Camera;
use crate::math::{Matrix4, Quaternion, Vector3};
use crate::mesh::Mesh;
use crate::rasterizer::Rasterizer;
use crate::scene::SceneNode;

/// Outline drawn over every filled triangle once the whole frame is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wireframe {
    pub edge_color: Color,
    pub vertex_color: Color,
    /// Marker radius in pixels; `None` draws edges only
    pub vertex_radius: Option<u32>,
}

impl Default for Wireframe {
    fn default() -> Self {
        Self {
            edge_color: Color::WHITE,
            vertex_color: Color::WHITE,
            vertex_radius: Some(2),
        }
    }
}

/// Renderer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Drop triangles that face away from the camera
    pub backface_culling: bool,
    pub wireframe: Option<Wireframe>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            backface_culling: true,
            wireframe: None,
        }
    }
}

/// Triangle counts for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub total: usize,
    pub culled: usize,
    pub off_screen: usize,
    pub drawn: usize,
}

impl std::ops::AddAssign for FrameStats {
    fn add_assign(&mut self, rhs: Self) {
        self.total += rhs.total;
        self.culled += rhs.culled;
        self.off_screen += rhs.off_screen;
        self.drawn += rhs.drawn;
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total {} culled {} off {} drawn {}",
            self.total, self.culled, self.off_screen, self.drawn
        )
    }
}

/// Why a triangle did not reach the rasterizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejected {
    BackFacing,
    OffScreen,
}

/// Renders a scene tree through a camera into a frame buffer
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Draw every meshed node under `root`. The caller clears `frame` first.
    ///
    /// One rejected triangle never stops the frame; it is only counted.
    pub fn render(&self, root: &SceneNode, camera: &Camera, frame: &mut FrameBuffer) -> FrameStats {
        let view = camera.view_matrix();
        let mut stats = FrameStats::default();
        let mut outlines = Vec::new();

        root.traverse(&Matrix4::identity(), &mut |node, world| {
            if let Some(mesh) = node.mesh() {
                stats += self.fill_mesh(mesh, &(view * *world), camera, frame, &mut outlines);
            }
        });
        self.draw_outlines(&outlines, frame);

        trace!("frame {}x{}: {}", frame.width(), frame.height(), stats);
        stats
    }

    /// Draw one mesh already placed in view space by `model_view`.
    pub fn render_mesh(
        &self,
        mesh: &Mesh,
        model_view: &Matrix4,
        camera: &Camera,
        frame: &mut FrameBuffer,
    ) -> FrameStats {
        let mut outlines = Vec::new();
        let stats = self.fill_mesh(mesh, model_view, camera, frame, &mut outlines);
        self.draw_outlines(&outlines, frame);
        stats
    }

    /// Rasterize a mesh, keeping the screen triangles of every drawn face in
    /// `outlines` when a wireframe is requested.
    fn fill_mesh(
        &self,
        mesh: &Mesh,
        model_view: &Matrix4,
        camera: &Camera,
        frame: &mut FrameBuffer,
        outlines: &mut Vec<[Vector3; 3]>,
    ) -> FrameStats {
        let raster = Rasterizer::for_frame(frame);
        let mut stats = FrameStats {
            total: mesh.face_count(),
            ..FrameStats::default()
        };

        for (triangle, color) in mesh.triangles() {
            let view_space = triangle.map(|v| model_view.transform_point(v));
            match self.prepare(view_space, camera, frame.width(), frame.height()) {
                Ok(screen) => {
                    raster.draw(screen, color, frame);
                    if self.options.wireframe.is_some() {
                        outlines.push(screen);
                    }
                    stats.drawn += 1;
                }
                Err(Rejected::BackFacing) => stats.culled += 1,
                Err(Rejected::OffScreen) => stats.off_screen += 1,
            }
        }
        stats
    }

    fn draw_outlines(&self, outlines: &[[Vector3; 3]], frame: &mut FrameBuffer) {
        let Some(style) = self.options.wireframe else {
            return;
        };
        let raster = Rasterizer::for_frame(frame);

        for &[p0, p1, p2] in outlines {
            for (a, b) in [(p0, p1), (p1, p2), (p2, p0)] {
                raster.draw_line((a.x, a.y), (b.x, b.y), style.edge_color, frame);
            }
        }
        if let Some(radius) = style.vertex_radius {
            for p in outlines.iter().flatten() {
                raster.draw_marker((p.x, p.y), radius, style.vertex_color, frame);
            }
        }
    }

    /// Cull, project and bounds-check a view-space triangle.
    ///
    /// Counter-clockwise front faces come out of the y-flipping projection
    /// with positive edge-function area, so vertex order is kept.
    fn prepare(
        &self,
        [v0, v1, v2]: [Vector3; 3],
        camera: &Camera,
        width: usize,
        height: usize,
    ) -> Result<[Vector3; 3], Rejected> {
        if self.options.backface_culling && !is_front_facing(v0, v1, v2) {
            return Err(Rejected::BackFacing);
        }

        let project = |v| camera.project_to_screen(v, width, height).ok_or(Rejected::OffScreen);
        let (p0, p1, p2) = (project(v0)?, project(v1)?, project(v2)?);

        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;
        if p0.x.max(p1.x).max(p2.x) < 0.0
            || p0.x.min(p1.x).min(p2.x) > max_x
            || p0.y.max(p1.y).max(p2.y) < 0.0
            || p0.y.min(p1.y).min(p2.y) > max_y
        {
            return Err(Rejected::OffScreen);
        }

        Ok([p0, p1, p2])
    }
}

/// A view-space triangle faces the camera (at the origin) when its
/// normal points towards it.
pub fn is_front_facing(v0: Vector3, v1: Vector3, v2: Vector3) -> bool {
    let normal = (v1 - v0).cross(v2 - v0);
    normal.dot(-v0) > 0.0
}

/// Accumulates per-axis angles from elapsed time and yields the matching
/// orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    /// Radians per second about X, Y and Z
    pub rates: Vector3,
    angles: Vector3,
}

impl Spin {
    pub fn new(rates: Vector3) -> Self {
        Self {
            rates,
            angles: Vector3::ZERO,
        }
    }

    /// 30, 45 and 60 degrees per second
    pub fn tumble() -> Self {
        Self::new(Vector3::new(
            30f32.to_radians(),
            45f32.to_radians(),
            60f32.to_radians(),
        ))
    }

    pub fn advance(&mut self, dt: f32) -> Quaternion {
        self.angles = self.angles + self.rates * dt;
        self.orientation()
    }

    pub fn orientation(&self) -> Quaternion {
        Quaternion::from_euler(self.angles.x, self.angles.y, self.angles.z)
    }

    /// Incremental rotation covering `dt` seconds
    pub fn step(&self, dt: f32) -> Quaternion {
        let delta = self.rates * dt;
        Quaternion::from_euler(delta.x, delta.y, delta.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use std::rc::Rc;

    fn cube_scene() -> SceneNode {
        let mut root = SceneNode::default();
        root.add_child(SceneNode::with_mesh(Rc::new(Mesh::cube(1.0)), Transform::default()));
        root
    }

    #[test]
    fn test_front_facing_triangle() {
        // Counter-clockwise seen from the origin, in front of the camera
        let (a, b, c) = (
            Vector3::new(0.0, 0.0, -5.0),
            Vector3::new(1.0, 0.0, -5.0),
            Vector3::new(0.0, 1.0, -5.0),
        );
        assert!(is_front_facing(a, b, c));
        assert!(!is_front_facing(a, c, b));
    }

    #[test]
    fn test_cube_front_view_draws_front_face_only() {
        let mut frame = FrameBuffer::new(64, 64);
        let camera = Camera::for_viewport(64, 64);
        let stats = Renderer::default().render(&cube_scene(), &camera, &mut frame);

        assert_eq!(stats.total, 12);
        assert_eq!(stats.drawn, 2);
        assert_eq!(stats.culled, 10);
        assert_eq!(frame.pixel(32, 32), Some(Color::GREEN));
        assert_eq!(frame.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_without_culling_all_faces_reach_rasterizer() {
        let mut frame = FrameBuffer::new(64, 64);
        let camera = Camera::for_viewport(64, 64);
        let renderer = Renderer::new(RenderOptions {
            backface_culling: false,
            ..RenderOptions::default()
        });
        let stats = renderer.render(&cube_scene(), &camera, &mut frame);

        assert_eq!(stats.culled, 0);
        assert_eq!(stats.drawn, 12);
        assert_eq!(frame.pixel(32, 32), Some(Color::GREEN));
    }

    #[test]
    fn test_geometry_behind_camera_is_off_screen() {
        let mut root = SceneNode::default();
        root.add_child(SceneNode::with_mesh(
            Rc::new(Mesh::cube(1.0)),
            Transform::from_position(0.0, 0.0, 10.0),
        ));
        let mut frame = FrameBuffer::new(32, 32);
        let renderer = Renderer::new(RenderOptions {
            backface_culling: false,
            ..RenderOptions::default()
        });
        let stats = renderer.render(&root, &Camera::for_viewport(32, 32), &mut frame);

        assert_eq!(stats.off_screen, 12);
        assert_eq!(stats.drawn, 0);
    }

    #[test]
    fn test_geometry_beside_viewport_is_off_screen() {
        let mut root = SceneNode::default();
        root.add_child(SceneNode::with_mesh(
            Rc::new(Mesh::cube(1.0)),
            Transform::from_position(50.0, 0.0, 0.0),
        ));
        let mut frame = FrameBuffer::new(32, 32);
        let renderer = Renderer::new(RenderOptions {
            backface_culling: false,
            ..RenderOptions::default()
        });
        let stats = renderer.render(&root, &Camera::for_viewport(32, 32), &mut frame);

        assert_eq!(stats.off_screen, 12);
        assert!(frame.depth().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_wireframe_sits_on_top_of_fill() {
        let mut frame = FrameBuffer::new(64, 64);
        let camera = Camera::for_viewport(64, 64);
        let renderer = Renderer::new(RenderOptions {
            wireframe: Some(Wireframe {
                vertex_radius: None,
                ..Wireframe::default()
            }),
            ..RenderOptions::default()
        });
        let stats = renderer.render(&cube_scene(), &camera, &mut frame);

        assert_eq!(stats.drawn, 2);
        // The front face's shared diagonal runs through the centre
        assert_eq!(frame.pixel(32, 32), Some(Color::WHITE));
        assert!(frame.depth_at(32, 32).unwrap().is_finite());
        // Inside the face, away from every edge
        assert_eq!(frame.pixel(34, 28), Some(Color::GREEN));
        assert_eq!(frame.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_wireframe_marks_vertices() {
        let mut plain = FrameBuffer::new(64, 64);
        let mut marked = FrameBuffer::new(64, 64);
        let camera = Camera::for_viewport(64, 64);
        let style = Wireframe {
            edge_color: Color::BLACK,
            vertex_color: Color::CYAN,
            vertex_radius: Some(1),
        };

        Renderer::default().render(&cube_scene(), &camera, &mut plain);
        Renderer::new(RenderOptions {
            wireframe: Some(style),
            ..RenderOptions::default()
        })
        .render(&cube_scene(), &camera, &mut marked);

        let cyan = marked.pixels().iter().filter(|&&c| c == Color::CYAN).count();
        assert!(cyan >= 4 * 5, "expected four vertex markers, got {} pixels", cyan);
        assert!(plain.pixels().iter().all(|&c| c != Color::CYAN));
    }

    #[test]
    fn test_spin_accumulates() {
        let mut spin = Spin::new(Vector3::new(0.0, std::f32::consts::PI, 0.0));
        spin.advance(0.25);
        let q = spin.advance(0.25);
        // Half a second at pi rad/s is a quarter turn about Y
        let rotated = q.rotate_vector(Vector3::Z);
        assert!((rotated - Vector3::X).length() < 1e-5);
    }
}
