//! SVG output backend.
//!
//! Elements are buffered in memory and the document is written in one go by
//! [`SvgSurface::finish`]. The file is created up front; if the write fails it
//! is removed again.

use log::{debug, error, warn};
use std::fmt::Write as FmtWrite;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::surface::{Bounds, Rgb, Surface, TextExtents};
use crate::utils::error::{AppError, AppResult};

/// Average glyph advance as a fraction of the font size (sans-serif)
const CHAR_WIDTH_EM: f64 = 0.5;
/// Ink height of mixed-case text as a fraction of the font size
const TEXT_HEIGHT_EM: f64 = 0.72;

/// Drawing backends known to the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Svg,
}

impl Backend {
    /// Backend able to produce `path`, judged by its extension
    pub fn for_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Some(Backend::Svg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum SvgElement {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Rgb,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Rgb,
        stroke_width: f64,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        font_size: f64,
        fill: Rgb,
    },
}

/// Vector surface writing a single-page SVG document
#[derive(Debug)]
pub struct SvgSurface {
    path: PathBuf,
    file: File,
    width: f64,
    height: f64,
    font_size: f64,
    origin: (f64, f64),
    elements: Vec<SvgElement>,
}

impl SvgSurface {
    /// Create the output file and an empty page.
    ///
    /// Returns `None` when the file cannot be created; the caller treats that
    /// the same as having no backend at all.
    pub fn create(path: &Path, width: f64, height: f64) -> Option<Self> {
        match File::create(path) {
            Ok(file) => Some(Self {
                path: path.to_path_buf(),
                file,
                width,
                height,
                font_size: 10.0,
                origin: (0.0, 0.0),
                elements: Vec::new(),
            }),
            Err(e) => {
                error!("Cannot create report file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Serialize the page to SVG markup
    pub fn render(&self) -> String {
        let mut svg = String::with_capacity(4096 + self.elements.len() * 96);

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="rgb(255,255,255)"/>"#);

        for element in &self.elements {
            let _ = writeln!(svg, "  {}", element_to_svg(element));
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write the document and close the file.
    ///
    /// On a write error the file is removed, so no partial report is left.
    pub fn finish(self) -> AppResult<PathBuf> {
        let document = self.render();
        write_or_discard(self.file, &self.path, &document)?;
        debug!(
            "Wrote {} elements to {}",
            self.elements.len(),
            self.path.display()
        );
        Ok(self.path)
    }

    fn at(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.origin.0, y + self.origin.1)
    }
}

impl Surface for SvgSurface {
    fn set_font_size(&mut self, size: f64) {
        if size <= 0.0 {
            warn!("Ignoring non-positive font size {}", size);
            return;
        }
        self.font_size = size;
    }

    fn measure_text(&self, text: &str) -> TextExtents {
        if text.is_empty() {
            return TextExtents::default();
        }
        TextExtents {
            width: text.chars().count() as f64 * self.font_size * CHAR_WIDTH_EM,
            height: self.font_size * TEXT_HEIGHT_EM,
        }
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, color: Rgb) {
        let (x, y) = self.at(x, y);
        self.elements.push(SvgElement::Text {
            x,
            y,
            text: text.to_string(),
            font_size: self.font_size,
            fill: color,
        });
    }

    fn draw_rect(&mut self, rect: Bounds, fill: Rgb) {
        let (x, y) = self.at(rect.x, rect.y);
        self.elements.push(SvgElement::Rect {
            x,
            y,
            width: rect.width.max(0.0),
            height: rect.height.max(0.0),
            fill,
        });
    }

    fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), stroke: Rgb, width: f64) {
        let (x1, y1) = self.at(from.0, from.1);
        let (x2, y2) = self.at(to.0, to.1);
        self.elements.push(SvgElement::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            stroke_width: width,
        });
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.origin.0 += dx;
        self.origin.1 += dy;
    }
}

fn write_or_discard<W: Write>(mut out: W, path: &Path, document: &str) -> AppResult<()> {
    let written = out
        .write_all(document.as_bytes())
        .and_then(|_| out.flush());
    drop(out);

    written.map_err(|e| {
        if let Err(remove_err) = fs::remove_file(path) {
            warn!("Cannot remove partial report {}: {}", path.display(), remove_err);
        }
        AppError::RenderError(format!("{}: {}", path.display(), e))
    })
}

fn rgb_to_css(color: Rgb) -> String {
    format!("rgb({},{},{})", color.r, color.g, color.b)
}

fn element_to_svg(element: &SvgElement) -> String {
    match element {
        SvgElement::Rect {
            x,
            y,
            width,
            height,
            fill,
        } => format!(
            r#"<rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" fill="{}"/>"#,
            rgb_to_css(*fill)
        ),
        SvgElement::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            stroke_width,
        } => format!(
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{}" stroke-width="{stroke_width}"/>"#,
            rgb_to_css(*stroke)
        ),
        SvgElement::Text {
            x,
            y,
            text,
            font_size,
            fill,
        } => {
            let escaped_text = text
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;")
                .replace('"', "&quot;");
            format!(
                r#"<text x="{x:.2}" y="{y:.2}" font-size="{font_size}" fill="{}" font-family="sans-serif">{escaped_text}</text>"#,
                rgb_to_css(*fill)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tempfile::tempdir;

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_backend_from_extension() {
        assert_eq!(Backend::for_path(Path::new("out/report.svg")), Some(Backend::Svg));
        assert_eq!(Backend::for_path(Path::new("REPORT.SVG")), Some(Backend::Svg));
        assert_eq!(Backend::for_path(Path::new("report.pdf")), None);
        assert_eq!(Backend::for_path(Path::new("report")), None);
    }

    #[test]
    fn test_text_metrics_scale_with_font() {
        let dir = tempdir().unwrap();
        let mut surface = SvgSurface::create(&dir.path().join("m.svg"), 100.0, 100.0).unwrap();

        surface.set_font_size(10.0);
        let small = surface.measure_text("abcd");
        surface.set_font_size(20.0);
        let large = surface.measure_text("abcd");

        assert_eq!(small.width, 20.0);
        assert_eq!(large.width, 40.0);
        assert!((large.height - 14.4).abs() < 1e-9);
        assert_eq!(surface.measure_text(""), TextExtents::default());
    }

    #[test]
    fn test_translate_and_escape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.svg");
        let mut surface = SvgSurface::create(&path, 200.0, 100.0).unwrap();

        surface.translate(10.0, 20.0);
        surface.draw_text("a<b & c", 5.0, 5.0, Rgb::BLACK);
        surface.draw_rect(Bounds::new(0.0, 0.0, 4.0, 3.0), Rgb::BLUE);
        let written = surface.finish().unwrap();

        let svg = fs::read_to_string(written).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"<text x="15.00" y="25.00""#));
        assert!(svg.contains("a&lt;b &amp; c"));
        assert!(svg.contains(r#"<rect x="10.00" y="20.00" width="4.00" height="3.00" fill="rgb(51,102,204)"/>"#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_uncreatable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("r.svg");
        assert!(SvgSurface::create(&path, 10.0, 10.0).is_none());
    }

    #[test]
    fn test_failed_write_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.svg");
        let surface = SvgSurface::create(&path, 10.0, 10.0).unwrap();
        assert!(path.exists());

        let err = write_or_discard(FullDisk, &path, &surface.render()).unwrap_err();
        assert!(matches!(err, AppError::RenderError(_)));
        assert!(!path.exists());
    }
}
