use std::collections::HashMap;

use crate::render::chart::{draw_bar_chart, Bar, ChartStyle};
use crate::render::surface::{Bounds, Rgb, Surface};
use crate::report::format::comma_number;

/// A ranked (label, count) entry
pub type CountPair = (String, u64);

/// Number of bars drawn by a count histogram
pub const MAX_BARS: usize = 10;

/// Tally of occurrences per label
#[derive(Debug, Clone, Default)]
pub struct CountHistogram {
    counts: HashMap<String, u64>,
    count_sum: u64,
}

impl CountHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, label: impl Into<String>, by: u64) {
        *self.counts.entry(label.into()).or_insert(0) += by;
        self.count_sum += by;
    }

    /// Sum of all counts, including entries outside the top list
    pub fn count_sum(&self) -> u64 {
        self.count_sum
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Up to `k` entries, highest count first; equal counts ordered by label
    pub fn top_list(&self, k: usize) -> Vec<CountPair> {
        let mut entries: Vec<CountPair> = self
            .counts
            .iter()
            .map(|(label, count)| (label.clone(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(k);
        entries
    }

    /// Draw the top entries as a bar chart and return the height used.
    ///
    /// An empty histogram only takes the room of its title and a note.
    pub fn render(&self, surface: &mut dyn Surface, bounds: Bounds, title: &str) -> f64 {
        let style = ChartStyle::titled(title);

        if self.is_empty() {
            surface.set_font_size(style.title_font_size);
            let title_extents = surface.measure_text(title);
            surface.draw_text(title, bounds.x, bounds.y + title_extents.height, Rgb::BLACK);

            surface.set_font_size(style.tick_font_size);
            let note = "No data";
            let note_extents = surface.measure_text(note);
            let note_y = bounds.y + title_extents.height * 1.5 + note_extents.height;
            surface.draw_text(note, bounds.x, note_y, Rgb::GRAY);
            return (note_y - bounds.y).min(bounds.height);
        }

        let top = self.top_list(MAX_BARS);
        let bars: Vec<Bar> = top
            .iter()
            .enumerate()
            .map(|(i, (_, count))| Bar::new(*count as f64).with_label((i + 1).to_string()))
            .collect();
        let max_label = comma_number(top.first().map(|(_, c)| *c).unwrap_or(0));

        draw_bar_chart(surface, bounds, &style, &bars, &max_label, ("", ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::testing::NullSurface;

    fn histogram(entries: &[(&str, u64)]) -> CountHistogram {
        let mut h = CountHistogram::new();
        for (label, count) in entries {
            h.increment(*label, *count);
        }
        h
    }

    #[test]
    fn test_top_list_order_and_ties() {
        let h = histogram(&[("b", 5), ("a", 5), ("c", 9), ("d", 1)]);
        let top = h.top_list(3);
        assert_eq!(
            top,
            vec![
                ("c".to_string(), 9),
                ("a".to_string(), 5),
                ("b".to_string(), 5)
            ]
        );
        assert_eq!(h.count_sum(), 20);
    }

    #[test]
    fn test_increment_accumulates() {
        let mut h = CountHistogram::new();
        h.increment("80", 1);
        h.increment("80", 2);
        assert_eq!(h.top_list(5), vec![("80".to_string(), 3)]);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_empty_render_is_short() {
        let mut surface = NullSurface::default();
        let height = CountHistogram::new().render(
            &mut surface,
            Bounds::new(0.0, 40.0, 100.0, 100.0),
            "Top Ports",
        );
        // title 8 * 1.5 + note 6
        assert_eq!(height, 18.0);
        assert_eq!(surface.texts.len(), 2);
    }

    #[test]
    fn test_full_render_uses_bounds() {
        let mut surface = NullSurface::default();
        let h = histogram(&[("x", 3)]);
        let height = h.render(&mut surface, Bounds::new(0.0, 0.0, 100.0, 80.0), "T");
        assert_eq!(height, 80.0);
    }
}
