use log::{log_enabled, trace, Level};
use pnet::packet::{
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    ipv4::Ipv4Packet,
    ipv6::Ipv6Packet,
    tcp::TcpPacket,
};
use std::net::{Ipv4Addr, Ipv6Addr};

const IPV4_MIN_HEADER_WORDS: usize = 5;
const IPV6_HEADER_LEN: usize = 40;
const TCP_MIN_HEADER_WORDS: usize = 5;

/// A decoded IPv4 header and the bytes it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Datagram<'a> {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub protocol: IpNextHeaderProtocol,
    pub payload: &'a [u8],
}

/// A decoded IPv6 fixed header and the bytes it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Datagram<'a> {
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
    pub next_header: IpNextHeaderProtocol,
    pub payload: &'a [u8],
}

/// The ports of a TCP segment, which is all the statistics look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpSegment {
    pub source_port: u16,
    pub destination_port: u16,
}

/// Network layer of a classified packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network<'a> {
    Ipv4(Ipv4Datagram<'a>),
    Ipv6(Ipv6Datagram<'a>),
    NonIp,
}

/// Result of running the classifier over one packet's network-layer bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<'a> {
    pub network: Network<'a>,
    pub tcp: Option<TcpSegment>,
}

/// Decode an IPv4 header.
///
/// The payload stops at the header's total length, or at the end of the
/// captured bytes when the capture was truncated.
pub fn decode_ipv4(data: &[u8]) -> Option<Ipv4Datagram<'_>> {
    let packet = Ipv4Packet::new(data)?;
    if packet.get_version() != 4 {
        return None;
    }

    let header_len = usize::from(packet.get_header_length()) * 4;
    if header_len < IPV4_MIN_HEADER_WORDS * 4 || header_len > data.len() {
        return None;
    }

    let total_len = usize::from(packet.get_total_length());
    let end = if total_len >= header_len {
        total_len.min(data.len())
    } else {
        data.len()
    };

    Some(Ipv4Datagram {
        source: packet.get_source(),
        destination: packet.get_destination(),
        protocol: packet.get_next_level_protocol(),
        payload: &data[header_len..end],
    })
}

/// Decode an IPv6 fixed header. Extension headers are left in the payload.
pub fn decode_ipv6(data: &[u8]) -> Option<Ipv6Datagram<'_>> {
    let packet = Ipv6Packet::new(data)?;
    if packet.get_version() != 6 || data.len() < IPV6_HEADER_LEN {
        return None;
    }

    let end = (IPV6_HEADER_LEN + usize::from(packet.get_payload_length())).min(data.len());

    Some(Ipv6Datagram {
        source: packet.get_source(),
        destination: packet.get_destination(),
        next_header: packet.get_next_header(),
        payload: &data[IPV6_HEADER_LEN..end],
    })
}

/// Decode a TCP header
pub fn decode_tcp(data: &[u8]) -> Option<TcpSegment> {
    let packet = TcpPacket::new(data)?;

    let header_len = usize::from(packet.get_data_offset()) * 4;
    if header_len < TCP_MIN_HEADER_WORDS * 4 || header_len > data.len() {
        return None;
    }

    Some(TcpSegment {
        source_port: packet.get_source(),
        destination_port: packet.get_destination(),
    })
}

/// Work out which network and transport protocol a packet carries.
///
/// IPv4 is tried first, then IPv6. A TCP segment is only looked for when the
/// IP header names TCP as its payload protocol. Malformed input is never an
/// error: it just classifies as `NonIp` or as IP without a segment.
pub fn classify(ip_data: &[u8]) -> Classification<'_> {
    let network = if let Some(ip4) = decode_ipv4(ip_data) {
        Network::Ipv4(ip4)
    } else if let Some(ip6) = decode_ipv6(ip_data) {
        Network::Ipv6(ip6)
    } else {
        Network::NonIp
    };

    let tcp = match &network {
        Network::Ipv4(ip4) if ip4.protocol == IpNextHeaderProtocols::Tcp => {
            decode_tcp(ip4.payload)
        }
        Network::Ipv6(ip6) if ip6.next_header == IpNextHeaderProtocols::Tcp => {
            decode_tcp(ip6.payload)
        }
        _ => None,
    };

    if log_enabled!(Level::Trace) {
        match &network {
            Network::Ipv4(ip4) => trace!(
                "IPv4 - src: {}, dst: {}, proto: {:?}, tcp: {}",
                ip4.source,
                ip4.destination,
                ip4.protocol,
                tcp.is_some()
            ),
            Network::Ipv6(ip6) => trace!(
                "IPv6 - src: {}, dst: {}, next: {:?}, tcp: {}",
                ip6.source,
                ip6.destination,
                ip6.next_header,
                tcp.is_some()
            ),
            Network::NonIp => trace!("Non-IP payload, {} bytes", ip_data.len()),
        }
    }

    Classification { network, tcp }
}
