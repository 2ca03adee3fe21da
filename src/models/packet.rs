use chrono::{DateTime, Local, TimeZone};
use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket};
use pnet::packet::Packet as PnetPacket;
use std::fmt;
use std::time::Duration;

/// Capture timestamp split into whole seconds and microseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Timeval {
    /// Seconds since the Unix epoch
    pub sec: i64,

    /// Sub-second component in microseconds
    pub usec: i64,
}

impl Timeval {
    pub fn new(sec: i64, usec: i64) -> Self {
        Self { sec, usec }
    }

    /// Seconds as a float, used for bucketing and plotting
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.usec as f64 / 1_000_000.0
    }

    /// Local wall-clock time at whole-second resolution
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        Local.timestamp_opt(self.sec, 0).single()
    }
}

impl From<Duration> for Timeval {
    fn from(elapsed: Duration) -> Self {
        Self {
            sec: elapsed.as_secs() as i64,
            usec: i64::from(elapsed.subsec_micros()),
        }
    }
}

impl fmt::Display for Timeval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.sec, self.usec)
    }
}

/// Link-layer framing of captured records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// Ethernet II frames
    Ethernet,

    /// Bare IPv4/IPv6 datagrams without a link header
    RawIp,
}

/// EtherType used for frames whose network protocol is unknown
pub const UNKNOWN_ETHER_TYPE: EtherType = EtherType(0x0000);

/// One captured packet as handed to the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketInfo {
    /// When the packet was captured
    pub ts: Timeval,

    /// Number of bytes actually captured
    pub caplen: u32,

    /// Length of the packet on the wire
    pub wire_len: u32,

    /// Network protocol announced by the link layer
    pub ether_type: EtherType,

    /// Network-layer bytes (may be empty or garbage)
    pub ip_data: Vec<u8>,
}

impl PacketInfo {
    /// Build a packet record from one captured link-layer frame.
    ///
    /// Frames too short to carry a link header still produce a record so
    /// that they are counted; they simply carry no network-layer bytes.
    pub fn from_frame(link: LinkType, ts: Timeval, wire_len: u32, frame: &[u8]) -> Self {
        let caplen = frame.len() as u32;

        let (ether_type, ip_data) = match link {
            LinkType::Ethernet => match EthernetPacket::new(frame) {
                Some(eth) => (eth.get_ethertype(), eth.payload().to_vec()),
                None => (UNKNOWN_ETHER_TYPE, Vec::new()),
            },
            LinkType::RawIp => {
                let ether_type = match frame.first().map(|b| b >> 4) {
                    Some(4) => EtherTypes::Ipv4,
                    Some(6) => EtherTypes::Ipv6,
                    _ => UNKNOWN_ETHER_TYPE,
                };
                (ether_type, frame.to_vec())
            }
        };

        Self {
            ts,
            caplen,
            wire_len,
            ether_type,
            ip_data,
        }
    }
}
