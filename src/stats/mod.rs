//! Per-session statistics fed by the report and drawn into its sections.

pub mod address_histogram;
pub mod bandwidth;
pub mod count_histogram;
pub mod iptree;
pub mod packetfall;
pub mod port_histogram;

pub use address_histogram::AddressHistogram;
pub use bandwidth::BandwidthHistogram;
pub use count_histogram::{CountHistogram, CountPair};
pub use iptree::IpTree;
pub use packetfall::PacketFall;
pub use port_histogram::PortHistogram;

/// Which end of a flow a histogram tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Source,
    Destination,
}

/// What a paired histogram reports back after drawing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedCounts {
    /// Height actually used on the page
    pub height: f64,

    /// Highest-ranked entries, best first
    pub top_list: Vec<CountPair>,

    /// Denominator for the entries' percentages
    pub count_sum: u64,
}
