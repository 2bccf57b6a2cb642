//! Color and depth targets for the rasterizer
use std::fmt;

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    pub const CYAN: Self = Self::rgb(0, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Row-major pixel and depth grids with the origin at the top left.
///
/// Owned by the presentation layer; the rasterizer only borrows the two
/// grids through [`FrameBuffer::targets_mut`].
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
    depth: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            pixels: vec![Color::BLACK; size],
            depth: vec![f32::INFINITY; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Fill every pixel with `color` and reset depth to +infinity
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    /// Change dimensions; contents are reset to black and +infinity.
    pub fn resize(&mut self, width: usize, height: usize) {
        let size = width * height;
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(size, Color::BLACK);
        self.depth.clear();
        self.depth.resize(size, f32::INFINITY);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        self.index(x, y).map(|idx| self.pixels[idx])
    }

    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        self.index(x, y).map(|idx| self.depth[idx])
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    pub fn targets_mut(&mut self) -> (&mut [Color], &mut [f32]) {
        (&mut self.pixels, &mut self.depth)
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}
