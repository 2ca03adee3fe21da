//! Bar-chart drawing shared by the histogram plots.

use super::surface::{Bounds, Rgb, Surface};

/// One bar; `highlight` is the part of `value` drawn in the accent color
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub value: f64,
    pub highlight: f64,
    pub label: Option<String>,
}

impl Bar {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            highlight: 0.0,
            label: None,
        }
    }

    pub fn with_highlight(mut self, highlight: f64) -> Self {
        self.highlight = highlight.min(self.value);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Title, axes and tick text settings for a bar chart
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub title: String,
    pub title_font_size: f64,
    pub tick_font_size: f64,
    /// Fraction of the width reserved left of the plot area for y ticks
    pub pad_left_factor: f64,
    pub bar_color: Rgb,
    pub highlight_color: Rgb,
}

impl ChartStyle {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            title_font_size: 8.0,
            tick_font_size: 6.0,
            pad_left_factor: 0.1,
            bar_color: Rgb::BLUE,
            highlight_color: Rgb::ORANGE,
        }
    }
}

/// Draw a bar chart filling `bounds` and return the height used.
///
/// `y_max_label` is written next to the top of the y axis; `x_labels` under
/// the left and right ends of the x axis.
pub fn draw_bar_chart(
    surface: &mut dyn Surface,
    bounds: Bounds,
    style: &ChartStyle,
    bars: &[Bar],
    y_max_label: &str,
    x_labels: (&str, &str),
) -> f64 {
    let mut top = bounds.y;

    if !style.title.is_empty() {
        surface.set_font_size(style.title_font_size);
        let extents = surface.measure_text(&style.title);
        surface.draw_text(&style.title, bounds.x, top + extents.height, Rgb::BLACK);
        top += extents.height * 1.5;
    }

    surface.set_font_size(style.tick_font_size);
    let tick_height = surface.measure_text("0").height;
    let plot = Bounds::new(
        bounds.x + bounds.width * style.pad_left_factor,
        top,
        bounds.width * (1.0 - style.pad_left_factor),
        (bounds.bottom() - top - tick_height * 2.0).max(0.0),
    );

    surface.draw_line(
        (plot.x, plot.y),
        (plot.x, plot.bottom()),
        Rgb::BLACK,
        0.5,
    );
    surface.draw_line(
        (plot.x, plot.bottom()),
        (plot.x + plot.width, plot.bottom()),
        Rgb::BLACK,
        0.5,
    );

    let max_value = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    if !y_max_label.is_empty() {
        let extents = surface.measure_text(y_max_label);
        surface.draw_text(
            y_max_label,
            (plot.x - extents.width - 2.0).max(bounds.x),
            plot.y + extents.height,
            Rgb::BLACK,
        );
    }

    if !bars.is_empty() && max_value > 0.0 {
        let slot = plot.width / bars.len() as f64;
        let bar_width = (slot * 0.8).max(0.5);

        for (i, bar) in bars.iter().enumerate() {
            let x = plot.x + slot * i as f64 + (slot - bar_width) / 2.0;
            let full = plot.height * bar.value / max_value;
            let accent = plot.height * bar.highlight / max_value;

            surface.draw_rect(
                Bounds::new(x, plot.bottom() - full, bar_width, full),
                style.bar_color,
            );
            if accent > 0.0 {
                surface.draw_rect(
                    Bounds::new(x, plot.bottom() - accent, bar_width, accent),
                    style.highlight_color,
                );
            }
            if let Some(label) = &bar.label {
                let extents = surface.measure_text(label);
                surface.draw_text(
                    label,
                    x + (bar_width - extents.width) / 2.0,
                    plot.bottom() + extents.height * 1.5,
                    Rgb::BLACK,
                );
            }
        }
    }

    let (left, right) = x_labels;
    if !left.is_empty() {
        surface.draw_text(left, plot.x, bounds.bottom(), Rgb::GRAY);
    }
    if !right.is_empty() {
        let extents = surface.measure_text(right);
        surface.draw_text(
            right,
            plot.x + plot.width - extents.width,
            bounds.bottom(),
            Rgb::GRAY,
        );
    }

    bounds.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::testing::NullSurface;

    #[test]
    fn test_chart_fills_requested_height() {
        let mut surface = NullSurface::default();
        let bars = vec![Bar::new(4.0).with_highlight(1.0), Bar::new(2.0).with_label("2")];
        let style = ChartStyle::titled("Bytes");

        let height = draw_bar_chart(
            &mut surface,
            Bounds::new(0.0, 10.0, 200.0, 100.0),
            &style,
            &bars,
            "4",
            ("start", "end"),
        );

        assert_eq!(height, 100.0);
        assert!(surface.texts.iter().any(|(t, _, _)| t == "Bytes"));
        assert!(surface.texts.iter().any(|(t, _, _)| t == "end"));
        // two axes, two bars, one accent
        assert_eq!(surface.shapes, 5);
    }

    #[test]
    fn test_highlight_clamped_to_value() {
        let bar = Bar::new(3.0).with_highlight(10.0);
        assert_eq!(bar.highlight, 3.0);
    }

    #[test]
    fn test_all_zero_bars_draw_only_axes() {
        let mut surface = NullSurface::default();
        draw_bar_chart(
            &mut surface,
            Bounds::new(0.0, 0.0, 50.0, 50.0),
            &ChartStyle::titled(""),
            &[Bar::new(0.0)],
            "",
            ("", ""),
        );
        assert_eq!(surface.shapes, 2);
        assert!(surface.texts.is_empty());
    }
}
