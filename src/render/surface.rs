//! Drawing-surface abstraction shared by the report and its plots.
//!
//! The report only ever talks to a [`Surface`]; which backend sits behind it
//! is decided once, when the render pass is set up.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in drawing units (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink by `pad` on every side
    pub fn inset(&self, pad: f64) -> Self {
        Self::new(
            self.x + pad,
            self.y + pad,
            self.width - pad * 2.0,
            self.height - pad * 2.0,
        )
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Size of a piece of text as the backend would draw it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtents {
    pub width: f64,
    pub height: f64,
}

/// RGB color with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const GRAY: Rgb = Rgb::new(0x99, 0x99, 0x99);
    pub const LIGHT_GRAY: Rgb = Rgb::new(0xdd, 0xdd, 0xdd);
    pub const BLUE: Rgb = Rgb::new(0x33, 0x66, 0xcc);
    pub const ORANGE: Rgb = Rgb::new(0xee, 0x88, 0x22);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Drawing primitives consumed by the report.
///
/// Coordinates are relative to the current origin, see [`Surface::translate`].
/// Text is positioned by its baseline.
pub trait Surface {
    /// Font size used by subsequent text calls
    fn set_font_size(&mut self, size: f64);

    /// Measure `text` at the current font size
    fn measure_text(&self, text: &str) -> TextExtents;

    fn draw_text(&mut self, text: &str, x: f64, y: f64, color: Rgb);

    fn draw_rect(&mut self, rect: Bounds, fill: Rgb);

    fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), stroke: Rgb, width: f64);

    /// Move the origin of all subsequent drawing
    fn translate(&mut self, dx: f64, dy: f64);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inset() {
        let page = Bounds::new(0.0, 0.0, 611.0, 792.0);
        let inner = page.inset(30.55);
        assert_eq!(inner.x, 30.55);
        assert_eq!(inner.y, 30.55);
        assert!((inner.width - 549.9).abs() < 1e-9);
        assert!((inner.bottom() - 761.45).abs() < 1e-9);
    }
}
