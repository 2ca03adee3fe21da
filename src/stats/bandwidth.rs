use log::debug;
use std::collections::BTreeMap;

use crate::capture::parser::TcpSegment;
use crate::models::packet::{PacketInfo, Timeval};
use crate::render::chart::{draw_bar_chart, Bar, ChartStyle};
use crate::render::surface::{Bounds, Surface};
use crate::report::format::format_size;

/// Most bars drawn across the band; seconds are merged to fit
pub const MAX_BARS: i64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Bucket {
    bytes: u64,
    tcp_bytes: u64,
    packets: u64,
}

/// Captured bytes per second, with the TCP share kept apart
#[derive(Debug, Clone)]
pub struct BandwidthHistogram {
    pub style: ChartStyle,
    buckets: BTreeMap<i64, Bucket>,
}

impl Default for BandwidthHistogram {
    fn default() -> Self {
        let mut style = ChartStyle::titled("TCP Packets Received");
        style.pad_left_factor = 0.2;
        style.tick_font_size = 6.0;
        Self {
            style,
            buckets: BTreeMap::new(),
        }
    }
}

impl BandwidthHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, packet: &PacketInfo, tcp: Option<&TcpSegment>) {
        let bucket = self.buckets.entry(packet.ts.sec).or_default();
        bucket.bytes += u64::from(packet.caplen);
        bucket.packets += 1;
        if tcp.is_some() {
            bucket.tcp_bytes += u64::from(packet.caplen);
        }
    }

    /// Total bytes seen, TCP and otherwise
    pub fn total_bytes(&self) -> u64 {
        self.buckets.values().map(|b| b.bytes).sum()
    }

    pub fn tcp_bytes(&self) -> u64 {
        self.buckets.values().map(|b| b.tcp_bytes).sum()
    }

    pub fn packet_count(&self) -> u64 {
        self.buckets.values().map(|b| b.packets).sum()
    }

    /// Bars as (bytes, tcp bytes), plus the seconds each bar covers
    fn bars(&self) -> (Vec<(u64, u64)>, i64) {
        let (first, last) = match (self.buckets.keys().next(), self.buckets.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return (Vec::new(), 1),
        };

        let span = last - first + 1;
        let seconds_per_bar = (span + MAX_BARS - 1) / MAX_BARS;
        let bar_count = ((span + seconds_per_bar - 1) / seconds_per_bar) as usize;

        let mut bars = vec![(0u64, 0u64); bar_count];
        for (second, bucket) in &self.buckets {
            let index = ((second - first) / seconds_per_bar) as usize;
            bars[index].0 += bucket.bytes;
            bars[index].1 += bucket.tcp_bytes;
        }
        (bars, seconds_per_bar)
    }

    pub fn render(&self, surface: &mut dyn Surface, bounds: Bounds) -> f64 {
        let (bars, seconds_per_bar) = self.bars();
        debug!(
            "Bandwidth: {} bars of {}s, {} bytes ({} TCP) in {} packets",
            bars.len(),
            seconds_per_bar,
            self.total_bytes(),
            self.tcp_bytes(),
            self.packet_count()
        );
        let chart_bars: Vec<Bar> = bars
            .iter()
            .map(|(bytes, tcp)| Bar::new(*bytes as f64).with_highlight(*tcp as f64))
            .collect();

        let max = bars.iter().map(|(bytes, _)| *bytes).max().unwrap_or(0);
        let y_label = if bars.is_empty() {
            String::new()
        } else {
            format!("{}/{}s", format_size(u128::from(max)), seconds_per_bar)
        };

        let time_label = |second: Option<&i64>| {
            second
                .and_then(|s| Timeval::new(*s, 0).to_local())
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default()
        };
        let start = time_label(self.buckets.keys().next());
        let end = time_label(self.buckets.keys().next_back());

        draw_bar_chart(
            surface,
            bounds,
            &self.style,
            &chart_bars,
            &y_label,
            (start.as_str(), end.as_str()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::packet::UNKNOWN_ETHER_TYPE;
    use crate::render::surface::testing::NullSurface;

    fn packet(sec: i64, caplen: u32) -> PacketInfo {
        PacketInfo {
            ts: Timeval::new(sec, 0),
            caplen,
            wire_len: caplen,
            ether_type: UNKNOWN_ETHER_TYPE,
            ip_data: Vec::new(),
        }
    }

    const SEGMENT: TcpSegment = TcpSegment {
        source_port: 1,
        destination_port: 2,
    };

    #[test]
    fn test_tcp_share() {
        let mut h = BandwidthHistogram::new();
        h.ingest(&packet(10, 100), Some(&SEGMENT));
        h.ingest(&packet(10, 50), None);
        h.ingest(&packet(12, 10), Some(&SEGMENT));

        assert_eq!(h.total_bytes(), 160);
        assert_eq!(h.tcp_bytes(), 110);
        assert_eq!(h.packet_count(), 3);

        let (bars, seconds_per_bar) = h.bars();
        assert_eq!(seconds_per_bar, 1);
        assert_eq!(bars, vec![(150, 100), (0, 0), (10, 10)]);
    }

    #[test]
    fn test_long_capture_merges_seconds() {
        let mut h = BandwidthHistogram::new();
        for sec in 0..600 {
            h.ingest(&packet(1_000 + sec, 1), None);
        }

        let (bars, seconds_per_bar) = h.bars();
        assert_eq!(seconds_per_bar, 10);
        assert_eq!(bars.len(), 60);
        assert!(bars.iter().all(|(bytes, _)| *bytes == 10));
    }

    #[test]
    fn test_empty_render() {
        let mut surface = NullSurface::default();
        let height = BandwidthHistogram::new().render(&mut surface, Bounds::new(0.0, 0.0, 300.0, 100.0));
        assert_eq!(height, 100.0);
    }
}
