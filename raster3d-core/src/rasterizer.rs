//! Edge-function triangle rasterizer with a nearer-wins depth test
use crate::buffer::{Color, FrameBuffer};
use crate::math::Vector3;

/// Triangles with less than this much signed area are skipped
pub const DEGENERATE_AREA: f32 = 1e-6;

/// Scan converts screen-space triangles into borrowed color and depth grids.
///
/// Vertices are pixel coordinates (`x` right, `y` down) with `z` holding the
/// depth to interpolate. Only triangles whose `edge(v0, v1, v2)` is positive
/// produce coverage; callers own winding and back-face decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rasterizer {
    width: usize,
    height: usize,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn for_frame(frame: &FrameBuffer) -> Self {
        Self::new(frame.width(), frame.height())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Signed parallelogram area of `(a, b, p)`
    pub fn edge(a: Vector3, b: Vector3, p: (f32, f32)) -> f32 {
        (p.0 - a.x) * (b.y - a.y) - (p.1 - a.y) * (b.x - a.x)
    }

    /// Rasterize into a [`FrameBuffer`] of the same dimensions.
    pub fn draw(&self, triangle: [Vector3; 3], color: Color, frame: &mut FrameBuffer) -> usize {
        let [v0, v1, v2] = triangle;
        let (pixels, depth) = frame.targets_mut();
        self.draw_triangle(v0, v1, v2, color, pixels, depth)
    }

    /// Fill every pixel whose center lies inside the triangle and passes the
    /// depth test. Returns the number of pixels written.
    ///
    /// Both grids must hold `width * height` entries in row-major order.
    pub fn draw_triangle(
        &self,
        v0: Vector3,
        v1: Vector3,
        v2: Vector3,
        color: Color,
        pixels: &mut [Color],
        depth: &mut [f32],
    ) -> usize {
        let size = self.width * self.height;
        assert_eq!(pixels.len(), size, "color buffer does not match rasterizer size");
        assert_eq!(depth.len(), size, "depth buffer does not match rasterizer size");

        let area = Self::edge(v0, v1, (v2.x, v2.y));
        if area.abs() < DEGENERATE_AREA || self.width == 0 || self.height == 0 {
            return 0;
        }
        let inv_area = 1.0 / area;

        // Bounding box, clipped to screen bounds
        let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i64).max(0);
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i64).min(self.width as i64 - 1);
        let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i64).max(0);
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i64).min(self.height as i64 - 1);

        let mut written = 0;
        for y in min_y..=max_y {
            let py = y as f32 + 0.5;
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, py);

                let w0 = Self::edge(v1, v2, p);
                let w1 = Self::edge(v2, v0, p);
                let w2 = Self::edge(v0, v1, p);
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = (w0 * v0.z + w1 * v1.z + w2 * v2.z) * inv_area;
                let idx = y as usize * self.width + x as usize;
                if z < depth[idx] {
                    depth[idx] = z;
                    pixels[idx] = color;
                    written += 1;
                }
            }
        }
        written
    }

    /// Draw a one-pixel line between two screen points, clipped to the
    /// frame. Depth is neither tested nor written. Returns the number of
    /// pixels written.
    pub fn draw_line(
        &self,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        frame: &mut FrameBuffer,
    ) -> usize {
        let (pixels, _) = frame.targets_mut();
        assert_eq!(
            pixels.len(),
            self.width * self.height,
            "color buffer does not match rasterizer size"
        );
        let Some((a, b)) = self.clip_line(from, to) else {
            return 0;
        };

        // Bresenham over the clipped, rounded endpoints
        let (mut x, mut y) = (a.0.round() as i64, a.1.round() as i64);
        let (end_x, end_y) = (b.0.round() as i64, b.1.round() as i64);
        let dx = (end_x - x).abs();
        let dy = -(end_y - y).abs();
        let step_x = if x < end_x { 1 } else { -1 };
        let step_y = if y < end_y { 1 } else { -1 };
        let mut err = dx + dy;

        let mut written = 0;
        loop {
            if let Some(idx) = self.index(x, y) {
                pixels[idx] = color;
                written += 1;
            }
            if x == end_x && y == end_y {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += step_x;
            }
            if e2 <= dx {
                err += dx;
                y += step_y;
            }
        }
        written
    }

    /// Fill a disc of `radius` pixels around `center` without a depth test.
    /// A radius of 0 marks the single nearest pixel.
    pub fn draw_marker(
        &self,
        center: (f32, f32),
        radius: u32,
        color: Color,
        frame: &mut FrameBuffer,
    ) -> usize {
        let (pixels, _) = frame.targets_mut();
        assert_eq!(
            pixels.len(),
            self.width * self.height,
            "color buffer does not match rasterizer size"
        );
        if !(center.0.is_finite() && center.1.is_finite()) {
            return 0;
        }

        let (cx, cy) = (center.0.round() as i64, center.1.round() as i64);
        let r = radius as i64;
        let mut written = 0;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                if let Some(idx) = self.index(cx + dx, cy + dy) {
                    pixels[idx] = color;
                    written += 1;
                }
            }
        }
        written
    }

    /// Liang-Barsky clip of a segment to `[0, width-1] x [0, height-1]`
    fn clip_line(&self, a: (f32, f32), b: (f32, f32)) -> Option<((f32, f32), (f32, f32))> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
            return None;
        }

        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let (mut t0, mut t1) = (0.0f32, 1.0f32);

        for (p, q) in [(-dx, a.0), (dx, max_x - a.0), (-dy, a.1), (dy, max_y - a.1)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    if r > t1 {
                        return None;
                    }
                    t0 = t0.max(r);
                } else {
                    if r < t0 {
                        return None;
                    }
                    t1 = t1.min(r);
                }
            }
        }

        Some((
            (a.0 + t0 * dx, a.1 + t0 * dy),
            (a.0 + t1 * dx, a.1 + t1 * dy),
        ))
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let inside = (0..self.width as i64).contains(&x) && (0..self.height as i64).contains(&y);
        inside.then(|| y as usize * self.width + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn v(x: f32, y: f32, z: f32) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn covered(frame: &FrameBuffer, color: Color) -> BTreeSet<(usize, usize)> {
        let mut set = BTreeSet::new();
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                if frame.pixel(x, y) == Some(color) {
                    set.insert((x, y));
                }
            }
        }
        set
    }

    #[test]
    fn test_right_triangle_coverage() {
        let mut frame = FrameBuffer::new(4, 4);
        let raster = Rasterizer::for_frame(&frame);

        let written = raster.draw([v(0.0, 0.0, 0.0), v(0.0, 4.0, 0.0), v(4.0, 0.0, 0.0)], Color::RED, &mut frame);

        let (a, b, c) = (v(0.0, 0.0, 0.0), v(0.0, 4.0, 0.0), v(4.0, 0.0, 0.0));
        let expected: BTreeSet<_> = (0..4usize)
            .flat_map(|y| (0..4usize).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                Rasterizer::edge(b, c, p) >= 0.0
                    && Rasterizer::edge(c, a, p) >= 0.0
                    && Rasterizer::edge(a, b, p) >= 0.0
            })
            .collect();
        assert_eq!(covered(&frame, Color::RED), expected);
        assert_eq!(written, 10);
        assert_eq!(frame.depth_at(0, 0), Some(0.0));
        assert_eq!(frame.depth_at(3, 3), Some(f32::INFINITY));
    }

    #[test]
    fn test_opposite_winding_is_rejected() {
        let mut frame = FrameBuffer::new(4, 4);
        let raster = Rasterizer::for_frame(&frame);

        let written = raster.draw([v(0.0, 0.0, 0.0), v(4.0, 0.0, 0.0), v(0.0, 4.0, 0.0)], Color::RED, &mut frame);

        assert_eq!(written, 0);
        assert!(covered(&frame, Color::RED).is_empty());
    }

    #[test]
    fn test_nearer_wins_regardless_of_order() {
        let far = [v(0.0, 0.0, 0.9), v(0.0, 8.0, 0.9), v(8.0, 0.0, 0.9)];
        let near = [v(0.0, 0.0, 0.1), v(0.0, 4.0, 0.1), v(4.0, 0.0, 0.1)];

        let mut far_first = FrameBuffer::new(8, 8);
        let raster = Rasterizer::for_frame(&far_first);
        raster.draw(far, Color::BLUE, &mut far_first);
        raster.draw(near, Color::GREEN, &mut far_first);

        let mut near_first = FrameBuffer::new(8, 8);
        raster.draw(near, Color::GREEN, &mut near_first);
        raster.draw(far, Color::BLUE, &mut near_first);

        assert_eq!(far_first.pixels(), near_first.pixels());
        assert_eq!(far_first.pixel(1, 1), Some(Color::GREEN));
        assert_eq!(far_first.pixel(5, 1), Some(Color::BLUE));
        assert!((far_first.depth_at(1, 1).unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_equal_depth_keeps_first() {
        let tri = [v(0.0, 0.0, 0.5), v(0.0, 4.0, 0.5), v(4.0, 0.0, 0.5)];
        let mut frame = FrameBuffer::new(4, 4);
        let raster = Rasterizer::for_frame(&frame);
        raster.draw(tri, Color::RED, &mut frame);
        let written = raster.draw(tri, Color::BLUE, &mut frame);

        assert_eq!(written, 0);
        assert_eq!(frame.pixel(0, 0), Some(Color::RED));
    }

    #[test]
    fn test_degenerate_triangle_writes_nothing() {
        let mut frame = FrameBuffer::new(4, 4);
        let raster = Rasterizer::for_frame(&frame);
        let before = frame.clone();

        let collinear = [v(0.0, 0.0, 0.1), v(1.0, 1.0, 0.1), v(3.0, 3.0, 0.1)];
        let point = [v(2.0, 2.0, 0.1); 3];
        assert_eq!(raster.draw(collinear, Color::RED, &mut frame), 0);
        assert_eq!(raster.draw(point, Color::RED, &mut frame), 0);

        assert_eq!(frame.pixels(), before.pixels());
        assert_eq!(frame.depth(), before.depth());
    }

    #[test]
    fn test_depth_is_interpolated() {
        let mut frame = FrameBuffer::new(10, 10);
        let raster = Rasterizer::for_frame(&frame);
        // Depth rises with x from 0 at x=0 to 1 at x=10
        raster.draw(
            [v(0.0, 0.0, 0.0), v(0.0, 20.0, 0.0), v(10.0, 0.0, 1.0)],
            Color::WHITE,
            &mut frame,
        );
        let d = frame.depth_at(2, 0).unwrap();
        assert!((d - 0.25).abs() < 1e-5, "depth {}", d);
    }

    #[test]
    fn test_partially_offscreen_triangle_is_clipped() {
        let mut frame = FrameBuffer::new(4, 4);
        let raster = Rasterizer::for_frame(&frame);
        let written = raster.draw(
            [v(-10.0, -10.0, 0.5), v(-10.0, 20.0, 0.5), v(20.0, -10.0, 0.5)],
            Color::CYAN,
            &mut frame,
        );
        assert_eq!(written, 16);
    }

    #[test]
    fn test_horizontal_line_covers_its_run() {
        let mut frame = FrameBuffer::new(8, 4);
        let raster = Rasterizer::for_frame(&frame);

        let written = raster.draw_line((1.0, 2.0), (5.0, 2.0), Color::WHITE, &mut frame);

        let expected: BTreeSet<_> = (1..=5).map(|x| (x, 2)).collect();
        assert_eq!(written, 5);
        assert_eq!(covered(&frame, Color::WHITE), expected);
        assert!(frame.depth().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_line_is_clipped_to_frame() {
        let mut frame = FrameBuffer::new(4, 4);
        let raster = Rasterizer::for_frame(&frame);

        // Diagonal from far outside through the frame
        let written = raster.draw_line((-100.0, -100.0), (100.0, 100.0), Color::WHITE, &mut frame);

        let expected: BTreeSet<_> = (0..4).map(|i| (i, i)).collect();
        assert_eq!(written, 4);
        assert_eq!(covered(&frame, Color::WHITE), expected);
    }

    #[test]
    fn test_off_frame_line_writes_nothing() {
        let mut frame = FrameBuffer::new(4, 4);
        let raster = Rasterizer::for_frame(&frame);
        let before = frame.clone();

        assert_eq!(raster.draw_line((-5.0, -1.0), (-1.0, -9.0), Color::WHITE, &mut frame), 0);
        assert_eq!(raster.draw_line((6.0, 0.0), (6.0, 3.0), Color::WHITE, &mut frame), 0);
        assert_eq!(raster.draw_line((0.0, 5.0), (3.0, 5.0), Color::WHITE, &mut frame), 0);
        assert_eq!(frame.pixels(), before.pixels());
    }

    #[test]
    fn test_line_ignores_depth() {
        let mut frame = FrameBuffer::new(4, 4);
        let raster = Rasterizer::for_frame(&frame);
        raster.draw([v(0.0, 0.0, 0.1), v(0.0, 8.0, 0.1), v(8.0, 0.0, 0.1)], Color::RED, &mut frame);

        raster.draw_line((0.0, 1.0), (3.0, 1.0), Color::WHITE, &mut frame);

        assert_eq!(frame.pixel(2, 1), Some(Color::WHITE));
        assert_eq!(frame.pixel(2, 0), Some(Color::RED));
        assert!((frame.depth_at(2, 1).unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_marker_is_clamped_disc() {
        let mut frame = FrameBuffer::new(5, 5);
        let raster = Rasterizer::for_frame(&frame);

        assert_eq!(raster.draw_marker((2.0, 2.0), 1, Color::WHITE, &mut frame), 5);
        let expected: BTreeSet<_> = [(2, 1), (1, 2), (2, 2), (3, 2), (2, 3)].into();
        assert_eq!(covered(&frame, Color::WHITE), expected);

        // Corner marker loses the pixels outside the frame
        assert_eq!(raster.draw_marker((0.0, 0.0), 1, Color::CYAN, &mut frame), 3);
        assert_eq!(raster.draw_marker((4.0, 4.0), 0, Color::CYAN, &mut frame), 1);
        assert_eq!(raster.draw_marker((-9.0, 2.0), 2, Color::CYAN, &mut frame), 0);
    }

    #[test]
    #[should_panic(expected = "color buffer")]
    fn test_mismatched_buffer_panics() {
        let raster = Rasterizer::new(4, 4);
        let mut pixels = vec![Color::BLACK; 3];
        let mut depth = vec![f32::INFINITY; 16];
        raster.draw_triangle(Vector3::ZERO, Vector3::ZERO, Vector3::ZERO, Color::RED, &mut pixels, &mut depth);
    }
}
