use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::DataLink;
use pnet::packet::ethernet::{EtherType, EtherTypes, MutableEthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::MutableIpv4Packet;
use pnet::packet::tcp::MutableTcpPacket;
use proptest::prelude::*;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;
use tempfile::{tempdir, NamedTempFile};

use pcapreport::capture::source::SavefileSource;
use pcapreport::models::packet::UNKNOWN_ETHER_TYPE;
use pcapreport::{OnePageReport, PacketInfo, ReportConfig, Timeval};

const ETHERNET_HEADER_LEN: usize = 14;

fn ethernet_frame(ether_type: EtherType, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; ETHERNET_HEADER_LEN + payload.len()];
    let mut eth = MutableEthernetPacket::new(&mut buf).unwrap();
    eth.set_ethertype(ether_type);
    buf[ETHERNET_HEADER_LEN..].copy_from_slice(payload);
    buf
}

fn ipv4_tcp_frame(src: Ipv4Addr, dst: Ipv4Addr, src_port: u16, dst_port: u16) -> Vec<u8> {
    let mut tcp = vec![0u8; 20 + 32];
    {
        let mut segment = MutableTcpPacket::new(&mut tcp).unwrap();
        segment.set_source(src_port);
        segment.set_destination(dst_port);
        segment.set_data_offset(5);
        segment.set_flags(0x18);
    }

    let mut ip = vec![0u8; 20 + tcp.len()];
    {
        let mut datagram = MutableIpv4Packet::new(&mut ip).unwrap();
        datagram.set_version(4);
        datagram.set_header_length(5);
        datagram.set_total_length((20 + tcp.len()) as u16);
        datagram.set_ttl(64);
        datagram.set_next_level_protocol(IpNextHeaderProtocols::Tcp);
        datagram.set_source(src);
        datagram.set_destination(dst);
    }
    ip[20..].copy_from_slice(&tcp);

    ethernet_frame(EtherTypes::Ipv4, &ip)
}

fn write_savefile(frames: &[(Duration, Vec<u8>)]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let header = PcapHeader {
        datalink: DataLink::ETHERNET,
        ..Default::default()
    };
    let mut writer = PcapWriter::with_header(file.reopen().unwrap(), header).unwrap();
    for (ts, data) in frames {
        writer
            .write_packet(&PcapPacket::new(*ts, data.len() as u32, data))
            .unwrap();
    }
    drop(writer);
    file
}

fn sample_capture() -> NamedTempFile {
    let mut frames = Vec::new();
    for i in 0..10u32 {
        let frame = ipv4_tcp_frame(
            Ipv4Addr::new(192, 168, 1, (i % 3) as u8 + 1),
            Ipv4Addr::new(10, 0, 0, 9),
            40_000 + i as u16,
            if i % 2 == 0 { 443 } else { 80 },
        );
        frames.push((Duration::new(1_700_000_000 + u64::from(i), 1_000 * (i + 1)), frame));
    }
    for i in 0..2u64 {
        frames.push((
            Duration::new(1_700_000_010 + i, 0),
            ethernet_frame(UNKNOWN_ETHER_TYPE, &[0u8; 28]),
        ));
    }
    write_savefile(&frames)
}

fn ingest_file(path: &Path, config: ReportConfig) -> OnePageReport {
    let mut report = OnePageReport::new(path.display().to_string(), config);
    for packet in SavefileSource::open(path).unwrap() {
        report.ingest(&packet);
    }
    report
}

#[test]
fn test_savefile_to_report() {
    let capture = sample_capture();
    let report = ingest_file(capture.path(), ReportConfig::default());

    assert_eq!(report.packet_count(), 12);
    assert_eq!(report.transport_count(EtherTypes::Ipv4), 10);
    assert_eq!(report.transport_count(UNKNOWN_ETHER_TYPE), 2);
    assert_eq!(report.transport_count(EtherTypes::Arp), 0);
    assert_eq!(report.src_tree().insertions(), 10);
    assert_eq!(report.dst_tree().insertions(), 10);
    assert_eq!(report.dst_port_histogram().count_sum(), 10);
    assert_eq!(
        report.dst_port_histogram().top_list(),
        vec![("443".to_string(), 5), ("80".to_string(), 5)]
    );
    assert_eq!(report.earliest(), Some(Timeval::new(1_700_000_000, 1)));
    assert_eq!(report.latest(), Timeval::new(1_700_000_009, 10));
}

#[test]
fn test_render_writes_svg() {
    let capture = sample_capture();
    let config = ReportConfig {
        filename: "report.svg".to_string(),
        ..ReportConfig::default()
    };
    let report = ingest_file(capture.path(), config);

    let outdir = tempdir().unwrap();
    let written = report.render(outdir.path()).unwrap().unwrap();
    assert_eq!(written, outdir.path().join("report.svg"));

    let svg = std::fs::read_to_string(&written).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Top Destination Ports"));
    assert!(svg.contains("10.0.0.9"));
    assert!(svg.contains("Transports: IPv4 83.33% IPv6 0.00% ARP 0.00% Other 16.67%"));
}

#[test]
fn test_render_without_backend_is_skipped() {
    let capture = sample_capture();
    let report = ingest_file(capture.path(), ReportConfig::default());

    let outdir = tempdir().unwrap();
    assert_eq!(report.render(outdir.path()).unwrap(), None);
    assert!(!outdir.path().join("report.pdf").exists());
}

#[test]
fn test_render_into_missing_directory_is_skipped() {
    let config = ReportConfig {
        filename: "report.svg".to_string(),
        ..ReportConfig::default()
    };
    let report = OnePageReport::new("empty", config);
    let result = report.render(Path::new("/nonexistent/pcapreport/out")).unwrap();
    assert_eq!(result, None);
}

proptest! {
    #[test]
    fn prop_counters_agree(
        packets in prop::collection::vec((0i64..10_000, 0i64..1_000_000, 0u32..2000, 0usize..3), 0..200)
    ) {
        let ether_types = [EtherTypes::Ipv4, EtherTypes::Ipv6, EtherTypes::Arp];
        let mut report = OnePageReport::new("prop", ReportConfig::default());
        let mut expected_bytes = 0u64;

        for (sec, usec, caplen, kind) in &packets {
            expected_bytes += u64::from(*caplen);
            report.ingest(&PacketInfo {
                ts: Timeval::new(*sec, *usec),
                caplen: *caplen,
                wire_len: *caplen,
                ether_type: ether_types[*kind],
                ip_data: Vec::new(),
            });
        }

        let tallied: u64 = report.transport_counts().values().sum();
        prop_assert_eq!(tallied, report.packet_count());
        prop_assert_eq!(report.packet_count(), packets.len() as u64);
        prop_assert_eq!(report.byte_count(), expected_bytes);
        prop_assert_eq!(report.packetfall().len(), packets.len());
    }
}
