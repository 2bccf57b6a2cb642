//! Half-block truecolor presentation of a frame buffer
use crossterm::{
    cursor,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use raster3d_core::{Color, FrameBuffer};
use std::io::Write;

/// Upper half block: foreground paints the top pixel, background the bottom
const HALF_BLOCK: char = '▀';

/// Presents a [`FrameBuffer`] with two vertically stacked pixels per cell
#[derive(Debug, Clone, Copy)]
pub struct HalfBlockPresenter {
    /// Terminal row the image starts on
    pub top_row: u16,
    /// Color for the missing bottom pixel of an odd-height frame
    pub fill: Color,
}

impl HalfBlockPresenter {
    pub fn new(top_row: u16, fill: Color) -> Self {
        Self { top_row, fill }
    }

    /// Pixel grid that fits `cols` x `rows` terminal cells below `top_row`
    pub fn frame_size(&self, cols: u16, rows: u16) -> (usize, usize) {
        let rows = rows.saturating_sub(self.top_row) as usize;
        (cols as usize, rows * 2)
    }

    pub fn draw<W: Write>(&self, frame: &FrameBuffer, writer: &mut W) -> std::io::Result<()> {
        let mut current: Option<(Color, Color)> = None;

        for row in 0..frame.height().div_ceil(2) {
            writer.queue(cursor::MoveTo(0, self.top_row + row as u16))?;
            for x in 0..frame.width() {
                let top = frame.pixel(x, row * 2).unwrap_or(self.fill);
                let bottom = frame.pixel(x, row * 2 + 1).unwrap_or(self.fill);

                // Only emit color changes
                if current != Some((top, bottom)) {
                    writer.queue(SetForegroundColor(to_term(top)))?;
                    writer.queue(SetBackgroundColor(to_term(bottom)))?;
                    current = Some((top, bottom));
                }
                writer.queue(Print(HALF_BLOCK))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Default for HalfBlockPresenter {
    fn default() -> Self {
        Self::new(1, Color::BLACK)
    }
}

fn to_term(color: Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}
