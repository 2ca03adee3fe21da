//! Single-pass page layout.
//!
//! Sections are drawn top to bottom in a fixed order. A block's height is
//! only known once it has been drawn, so every step draws at the cursor and
//! then pushes the cursor down; nothing is ever moved back up.

use chrono::{DateTime, Local};
use log::debug;
use pnet::packet::ethernet::EtherTypes;

use super::format::{comma_number, format_size, percent_of};
use super::{OnePageReport, TITLE_VERSION};
use crate::models::packet::Timeval;
use crate::render::surface::{Bounds, Rgb, Surface, TextExtents};
use crate::stats::{CountPair, RenderedCounts};

/// Header line gap as a fraction of the header font size
pub const LINE_SPACE_FACTOR: f64 = 0.25;
/// Extra line gaps left after each half of the header
pub const HEADER_TRAILER_LINES: f64 = 4.0;
/// Vertical room taken by a histogram, as a multiple of its height
pub const HISTOGRAM_PAD_FACTOR_Y: f64 = 1.0;
/// Paired histograms are each this fraction of the page width
pub const ADDRESS_HISTOGRAM_WIDTH_DIVISOR: f64 = 2.5;
pub const BANDWIDTH_HISTOGRAM_HEIGHT: f64 = 100.0;
pub const ADDRESS_HISTOGRAM_HEIGHT: f64 = 100.0;
/// Top-N row height as a multiple of its tallest text
pub const TOP_LIST_ROW_SCALE: f64 = 1.5;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Vertical position inside the printable area of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    bounds: Bounds,
    offset: f64,
}

impl LayoutCursor {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            offset: 0.0,
        }
    }

    /// Distance from the top of the printable area
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn width(&self) -> f64 {
        self.bounds.width
    }

    pub fn advance(&mut self, by: f64) {
        self.offset += by;
    }
}

/// Progress of a render pass; each state names the last section drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    NotStarted,
    HeaderRendered,
    BandwidthRendered,
    MapPlaceholder,
    WaterfallRendered,
    AddressHistogramsRendered,
    PortHistogramsRendered,
    Done,
}

/// One top-to-bottom layout of a report onto a surface
pub struct RenderPass<'a> {
    report: &'a OnePageReport,
    surface: &'a mut dyn Surface,
    cursor: LayoutCursor,
    state: PassState,
    generated: DateTime<Local>,
}

impl<'a> RenderPass<'a> {
    /// Start a pass over `bounds`, in coordinates already relative to the
    /// top-left of the printable area
    pub fn new(report: &'a OnePageReport, surface: &'a mut dyn Surface, bounds: Bounds) -> Self {
        Self::generated_at(report, surface, bounds, Local::now())
    }

    /// Same as [`RenderPass::new`] with a fixed "Generated" time
    pub fn generated_at(
        report: &'a OnePageReport,
        surface: &'a mut dyn Surface,
        bounds: Bounds,
        generated: DateTime<Local>,
    ) -> Self {
        Self {
            report,
            surface,
            cursor: LayoutCursor::new(bounds),
            state: PassState::NotStarted,
            generated,
        }
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn cursor(&self) -> LayoutCursor {
        self.cursor
    }

    /// Draw the next section and return the new state. Once `Done`, does nothing.
    pub fn step(&mut self) -> PassState {
        self.state = match self.state {
            PassState::NotStarted => {
                self.render_header();
                PassState::HeaderRendered
            }
            PassState::HeaderRendered => {
                self.render_bandwidth_histogram();
                PassState::BandwidthRendered
            }
            PassState::BandwidthRendered => {
                self.render_map();
                PassState::MapPlaceholder
            }
            PassState::MapPlaceholder => {
                self.render_packetfall();
                PassState::WaterfallRendered
            }
            PassState::WaterfallRendered => {
                self.render_address_histograms();
                PassState::AddressHistogramsRendered
            }
            PassState::AddressHistogramsRendered => {
                self.render_port_histograms();
                PassState::PortHistogramsRendered
            }
            PassState::PortHistogramsRendered | PassState::Done => PassState::Done,
        };
        debug!(
            "Render pass at {:?}, cursor {:.2}",
            self.state,
            self.cursor.offset()
        );
        self.state
    }

    /// Draw every remaining section and hand back the final cursor
    pub fn run(mut self) -> LayoutCursor {
        while self.step() != PassState::Done {}
        self.cursor
    }

    fn render_header(&mut self) {
        let report = self.report;
        let font_size = report.config.header_font_size;
        let line_space = font_size * LINE_SPACE_FACTOR;

        let input = format!("Input: {}", report.source_identifier);
        let generated = format!("Generated: {}", self.generated.format(DATE_FORMAT));
        for text in [TITLE_VERSION, input.as_str(), generated.as_str()] {
            render_text_line(&mut *self.surface, &mut self.cursor, text, font_size, line_space);
        }
        self.cursor.advance(line_space * HEADER_TRAILER_LINES);

        let date_range = format!(
            "Date range: {} to {}",
            local_time(report.earliest.unwrap_or_default()),
            local_time(report.latest)
        );
        let packets = format!(
            "Packets analyzed: {} ({})",
            comma_number(report.packet_count),
            format_size(u128::from(report.byte_count))
        );
        let transports = transport_breakdown(report);
        for text in [date_range.as_str(), packets.as_str(), transports.as_str()] {
            render_text_line(&mut *self.surface, &mut self.cursor, text, font_size, line_space);
        }
        self.cursor.advance(line_space * HEADER_TRAILER_LINES);
    }

    fn render_bandwidth_histogram(&mut self) {
        let bounds = Bounds::new(
            0.0,
            self.cursor.offset(),
            self.cursor.width(),
            BANDWIDTH_HISTOGRAM_HEIGHT,
        );
        let height = self.report.bandwidth_histogram.render(&mut *self.surface, bounds);
        self.cursor.advance(height * HISTOGRAM_PAD_FACTOR_Y);
    }

    /// Reserved for a geographic map of endpoints; draws nothing
    fn render_map(&mut self) {}

    fn render_packetfall(&mut self) {
        let bounds = Bounds::new(
            0.0,
            self.cursor.offset(),
            self.cursor.width(),
            BANDWIDTH_HISTOGRAM_HEIGHT,
        );
        let height = self.report.packetfall.render(&mut *self.surface, bounds);
        self.cursor.advance(height * HISTOGRAM_PAD_FACTOR_Y);
    }

    fn render_address_histograms(&mut self) {
        let report = self.report;
        self.render_pair(
            |surface, bounds| {
                report
                    .src_addr_histogram
                    .render_from_tree(surface, bounds, &report.src_tree)
            },
            |surface, bounds| {
                report
                    .dst_addr_histogram
                    .render_from_tree(surface, bounds, &report.dst_tree)
            },
        );
    }

    fn render_port_histograms(&mut self) {
        let report = self.report;
        self.render_pair(
            |surface, bounds| report.src_port_histogram.render(surface, bounds),
            |surface, bounds| report.dst_port_histogram.render(surface, bounds),
        );
    }

    /// Draw two histograms side by side at the cursor, then their top-N lists
    fn render_pair<L, R>(&mut self, left: L, right: R)
    where
        L: FnOnce(&mut dyn Surface, Bounds) -> RenderedCounts,
        R: FnOnce(&mut dyn Surface, Bounds) -> RenderedCounts,
    {
        let width = self.cursor.width() / ADDRESS_HISTOGRAM_WIDTH_DIVISOR;

        let mut left_bounds = Bounds::new(0.0, self.cursor.offset(), width, ADDRESS_HISTOGRAM_HEIGHT);
        let left_counts = left(&mut *self.surface, left_bounds);
        left_bounds.height = left_counts.height;

        let mut right_bounds = Bounds::new(
            self.cursor.width() - width,
            self.cursor.offset(),
            width,
            ADDRESS_HISTOGRAM_HEIGHT,
        );
        let right_counts = right(&mut *self.surface, right_bounds);
        right_bounds.height = right_counts.height;

        self.cursor
            .advance(left_bounds.height.max(right_bounds.height));

        render_dual_top_n(
            &mut *self.surface,
            &mut self.cursor,
            self.report.config.top_n,
            self.report.config.top_list_font_size,
            (&left_counts, left_bounds),
            (&right_counts, right_bounds),
        );
    }
}

/// Draw `text` with its top at the cursor, returning its extents
fn render_text(
    surface: &mut dyn Surface,
    cursor: &LayoutCursor,
    text: &str,
    font_size: f64,
    x_offset: f64,
) -> TextExtents {
    surface.set_font_size(font_size);
    let extents = surface.measure_text(text);
    surface.draw_text(text, x_offset, cursor.offset() + extents.height, Rgb::BLACK);
    extents
}

fn render_text_line(
    surface: &mut dyn Surface,
    cursor: &mut LayoutCursor,
    text: &str,
    font_size: f64,
    line_space: f64,
) {
    let extents = render_text(surface, cursor, text, font_size, 0.0);
    cursor.advance(extents.height + line_space);
}

/// Row text for the `rank`-th (0-based) entry of a top list
fn top_n_entry(rank: usize, pair: &CountPair, total: u64) -> String {
    let (label, count) = pair;
    // truncated, so 99.9% reads as 99%
    let percentage = percent_of(*count, total) as u64;
    format!(
        "{}. {} - {} ({}%)",
        rank + 1,
        label,
        comma_number(*count),
        percentage
    )
}

/// Write the top entries of two paired histograms in synchronized rows
/// under their plots, then line the cursor up below the taller plot.
fn render_dual_top_n(
    surface: &mut dyn Surface,
    cursor: &mut LayoutCursor,
    rows: usize,
    font_size: f64,
    left: (&RenderedCounts, Bounds),
    right: (&RenderedCounts, Bounds),
) {
    let (left_counts, left_bounds) = left;
    let (right_counts, right_bounds) = right;

    for rank in 0..rows {
        let mut left_extents = TextExtents::default();
        let mut right_extents = TextExtents::default();

        if let Some(pair) = left_counts.top_list.get(rank) {
            let text = top_n_entry(rank, pair, left_counts.count_sum);
            left_extents = render_text(surface, cursor, &text, font_size, left_bounds.x);
        }
        if let Some(pair) = right_counts.top_list.get(rank) {
            let text = top_n_entry(rank, pair, right_counts.count_sum);
            right_extents = render_text(surface, cursor, &text, font_size, right_bounds.x);
        }

        cursor.advance(left_extents.height.max(right_extents.height) * TOP_LIST_ROW_SCALE);
    }

    cursor.advance(
        left_bounds.height.max(right_bounds.height) * (HISTOGRAM_PAD_FACTOR_Y - 1.0),
    );
}

fn transport_breakdown(report: &OnePageReport) -> String {
    let total: u64 = report.transport_counts.values().sum();
    let ipv4 = report.transport_count(EtherTypes::Ipv4);
    let ipv6 = report.transport_count(EtherTypes::Ipv6);
    let arp = report.transport_count(EtherTypes::Arp);
    let other = if total == 0 {
        0.0
    } else {
        100.0 - percent_of(ipv4 + ipv6 + arp, total)
    };

    format!(
        "Transports: IPv4 {:.2}% IPv6 {:.2}% ARP {:.2}% Other {:.2}%",
        percent_of(ipv4, total),
        percent_of(ipv6, total),
        percent_of(arp, total),
        other
    )
}

fn local_time(ts: Timeval) -> String {
    ts.to_local()
        .map(|t| t.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| ts.to_string())
}
