pub mod chart;
pub mod surface;
pub mod svg;

pub use surface::{Bounds, Rgb, Surface, TextExtents};
pub use svg::{Backend, SvgSurface};
