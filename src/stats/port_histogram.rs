use super::count_histogram::MAX_BARS;
use super::{CountHistogram, Direction, RenderedCounts};
use crate::capture::parser::TcpSegment;
use crate::render::surface::{Bounds, Surface};

/// Tally of TCP source or destination ports
#[derive(Debug, Clone)]
pub struct PortHistogram {
    pub direction: Direction,
    pub title: String,
    counts: CountHistogram,
}

impl PortHistogram {
    pub fn new(direction: Direction, title: impl Into<String>) -> Self {
        Self {
            direction,
            title: title.into(),
            counts: CountHistogram::new(),
        }
    }

    pub fn ingest(&mut self, tcp: &TcpSegment) {
        let port = match self.direction {
            Direction::Source => tcp.source_port,
            Direction::Destination => tcp.destination_port,
        };
        self.counts.increment(port.to_string(), 1);
    }

    pub fn count_sum(&self) -> u64 {
        self.counts.count_sum()
    }

    pub fn top_list(&self) -> Vec<super::CountPair> {
        self.counts.top_list(MAX_BARS)
    }

    pub fn render(&self, surface: &mut dyn Surface, bounds: Bounds) -> RenderedCounts {
        RenderedCounts {
            height: self.counts.render(surface, bounds, &self.title),
            top_list: self.top_list(),
            count_sum: self.count_sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(source_port: u16, destination_port: u16) -> TcpSegment {
        TcpSegment {
            source_port,
            destination_port,
        }
    }

    #[test]
    fn test_direction_picks_port() {
        let mut src = PortHistogram::new(Direction::Source, "src");
        let mut dst = PortHistogram::new(Direction::Destination, "dst");
        for seg in [segment(5000, 80), segment(5001, 80), segment(5000, 443)] {
            src.ingest(&seg);
            dst.ingest(&seg);
        }

        assert_eq!(src.top_list()[0], ("5000".to_string(), 2));
        assert_eq!(dst.top_list()[0], ("80".to_string(), 2));
        assert_eq!(dst.top_list()[1], ("443".to_string(), 1));
        assert_eq!(src.count_sum(), 3);
        assert_eq!(dst.count_sum(), 3);
    }
}
