use log::warn;

use crate::models::packet::{PacketInfo, Timeval};
use crate::render::surface::{Bounds, Rgb, Surface};

/// Events kept before further packets are only counted
pub const MAX_EVENTS: usize = 250_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FallEvent {
    ts: Timeval,
    size: u32,
}

/// Per-packet timeline: one tick per packet, positioned by capture time
/// and scaled by captured size
#[derive(Debug, Clone)]
pub struct PacketFall {
    /// Fraction of the band width left empty on the left, lining up with the
    /// bandwidth histogram's y-axis gutter
    pub pad_left_factor: f64,
    events: Vec<FallEvent>,
    dropped: u64,
}

impl Default for PacketFall {
    fn default() -> Self {
        Self {
            pad_left_factor: 0.2,
            events: Vec::new(),
            dropped: 0,
        }
    }
}

impl PacketFall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, packet: &PacketInfo) {
        if self.events.len() >= MAX_EVENTS {
            if self.dropped == 0 {
                warn!(
                    "Packet timeline full at {} events; later packets are not drawn",
                    MAX_EVENTS
                );
            }
            self.dropped += 1;
            return;
        }
        self.events.push(FallEvent {
            ts: packet.ts,
            size: packet.caplen,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Packets not kept because the timeline was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn render(&self, surface: &mut dyn Surface, bounds: Bounds) -> f64 {
        let area = Bounds::new(
            bounds.x + bounds.width * self.pad_left_factor,
            bounds.y,
            bounds.width * (1.0 - self.pad_left_factor),
            bounds.height,
        );
        surface.draw_rect(area, Rgb::LIGHT_GRAY);

        let (first, last) = match (
            self.events.iter().map(|e| e.ts.as_secs_f64()).reduce(f64::min),
            self.events.iter().map(|e| e.ts.as_secs_f64()).reduce(f64::max),
        ) {
            (Some(first), Some(last)) => (first, last),
            _ => return bounds.height,
        };
        let span = last - first;
        let max_size = self.events.iter().map(|e| e.size).max().unwrap_or(0).max(1);

        for event in &self.events {
            let offset = if span > 0.0 {
                (event.ts.as_secs_f64() - first) / span
            } else {
                0.5
            };
            let x = area.x + area.width * offset;
            let tick = area.height * f64::from(event.size) / f64::from(max_size);
            surface.draw_line(
                (x, area.bottom()),
                (x, area.bottom() - tick),
                Rgb::BLUE,
                0.25,
            );
        }

        bounds.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::packet::UNKNOWN_ETHER_TYPE;
    use crate::render::surface::testing::NullSurface;

    fn packet(sec: i64, usec: i64, caplen: u32) -> PacketInfo {
        PacketInfo {
            ts: Timeval::new(sec, usec),
            caplen,
            wire_len: caplen,
            ether_type: UNKNOWN_ETHER_TYPE,
            ip_data: Vec::new(),
        }
    }

    #[test]
    fn test_one_tick_per_packet() {
        let mut fall = PacketFall::new();
        fall.ingest(&packet(1, 0, 60));
        fall.ingest(&packet(1, 500_000, 1500));
        fall.ingest(&packet(2, 0, 40));

        let mut surface = NullSurface::default();
        let height = fall.render(&mut surface, Bounds::new(0.0, 0.0, 500.0, 100.0));
        assert_eq!(height, 100.0);
        // background plus three ticks
        assert_eq!(surface.shapes, 4);
        assert_eq!(fall.len(), 3);
    }

    #[test]
    fn test_overflow_is_counted() {
        let mut fall = PacketFall::new();
        fall.events = vec![
            FallEvent {
                ts: Timeval::default(),
                size: 1
            };
            MAX_EVENTS
        ];
        fall.ingest(&packet(9, 0, 1));
        fall.ingest(&packet(9, 1, 1));
        assert_eq!(fall.len(), MAX_EVENTS);
        assert_eq!(fall.dropped(), 2);
    }
}
