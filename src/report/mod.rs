//! One-page capture report: the per-session aggregate, its ingestion
//! pipeline, and the entry point that lays the page out.

pub mod format;
pub mod layout;

use log::{debug, info, trace, warn};
use pnet::packet::ethernet::EtherType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::capture::parser::{self, Network};
use crate::models::config::ReportConfig;
use crate::models::packet::{PacketInfo, Timeval};
use crate::render::surface::Surface;
use crate::render::svg::{Backend, SvgSurface};
use crate::stats::{
    AddressHistogram, BandwidthHistogram, Direction, IpTree, PacketFall, PortHistogram,
};
use crate::utils::error::AppResult;

use self::layout::{LayoutCursor, RenderPass};

/// Product name and version printed at the top of the page
pub const TITLE_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Everything accumulated over one capture session
#[derive(Debug)]
pub struct OnePageReport {
    source_identifier: String,
    config: ReportConfig,

    packet_count: u64,
    byte_count: u64,
    wire_byte_count: u64,
    earliest: Option<Timeval>,
    latest: Timeval,
    transport_counts: HashMap<EtherType, u64>,

    bandwidth_histogram: BandwidthHistogram,
    src_addr_histogram: AddressHistogram,
    dst_addr_histogram: AddressHistogram,
    src_port_histogram: PortHistogram,
    dst_port_histogram: PortHistogram,
    packetfall: PacketFall,
    src_tree: IpTree,
    dst_tree: IpTree,
}

impl OnePageReport {
    pub fn new(source_identifier: impl Into<String>, config: ReportConfig) -> Self {
        Self {
            source_identifier: source_identifier.into(),
            config,
            packet_count: 0,
            byte_count: 0,
            wire_byte_count: 0,
            earliest: None,
            latest: Timeval::default(),
            transport_counts: HashMap::new(),
            bandwidth_histogram: BandwidthHistogram::new(),
            src_addr_histogram: AddressHistogram::new("Top Source Addresses"),
            dst_addr_histogram: AddressHistogram::new("Top Destination Addresses"),
            src_port_histogram: PortHistogram::new(Direction::Source, "Top Source Ports"),
            dst_port_histogram: PortHistogram::new(Direction::Destination, "Top Destination Ports"),
            packetfall: PacketFall::new(),
            src_tree: IpTree::new(),
            dst_tree: IpTree::new(),
        }
    }

    /// Fold one packet into the report. Never fails: packets that do not
    /// decode are counted and otherwise left out.
    pub fn ingest(&mut self, packet: &PacketInfo) {
        if self.earliest.is_none() {
            self.earliest = Some(packet.ts);
        }
        // Both components must grow: a later second with a smaller
        // microsecond value leaves `latest` where it was.
        if packet.ts.sec > self.latest.sec && packet.ts.usec > self.latest.usec {
            self.latest = packet.ts;
        }

        self.packet_count += 1;
        self.byte_count += u64::from(packet.caplen);
        self.wire_byte_count += u64::from(packet.wire_len);
        *self.transport_counts.entry(packet.ether_type).or_insert(0) += 1;

        let classified = parser::classify(&packet.ip_data);
        match &classified.network {
            Network::Ipv6(ip6) => {
                self.src_tree.add(&ip6.source.octets());
                self.dst_tree.add(&ip6.destination.octets());
            }
            Network::Ipv4(ip4) => {
                self.src_tree.add(&ip4.source.octets());
                self.dst_tree.add(&ip4.destination.octets());
            }
            Network::NonIp => {
                trace!(
                    "Packet {} ({:?}) has no IP layer",
                    self.packet_count,
                    packet.ether_type
                );
            }
        }

        let tcp = classified.tcp;
        self.bandwidth_histogram.ingest(packet, tcp.as_ref());
        if let Some(segment) = &tcp {
            self.src_port_histogram.ingest(segment);
            self.dst_port_histogram.ingest(segment);
        }
        self.packetfall.ingest(packet);
    }

    pub fn source_identifier(&self) -> &str {
        &self.source_identifier
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    /// Captured bytes, the sum of every packet's captured length
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// Bytes on the wire, before any snap-length truncation
    pub fn wire_byte_count(&self) -> u64 {
        self.wire_byte_count
    }

    /// Timestamp of the first packet, if any
    pub fn earliest(&self) -> Option<Timeval> {
        self.earliest
    }

    pub fn latest(&self) -> Timeval {
        self.latest
    }

    pub fn transport_counts(&self) -> &HashMap<EtherType, u64> {
        &self.transport_counts
    }

    pub fn transport_count(&self, ether_type: EtherType) -> u64 {
        self.transport_counts.get(&ether_type).copied().unwrap_or(0)
    }

    pub fn src_tree(&self) -> &IpTree {
        &self.src_tree
    }

    pub fn dst_tree(&self) -> &IpTree {
        &self.dst_tree
    }

    pub fn src_port_histogram(&self) -> &PortHistogram {
        &self.src_port_histogram
    }

    pub fn dst_port_histogram(&self) -> &PortHistogram {
        &self.dst_port_histogram
    }

    pub fn bandwidth_histogram(&self) -> &BandwidthHistogram {
        &self.bandwidth_histogram
    }

    pub fn packetfall(&self) -> &PacketFall {
        &self.packetfall
    }

    /// Render the report into `outdir`.
    ///
    /// Returns `Ok(None)` without writing anything when no drawing backend
    /// handles the configured filename or the file cannot be created.
    pub fn render(&self, outdir: &Path) -> AppResult<Option<PathBuf>> {
        let path = outdir.join(&self.config.filename);

        let backend = match Backend::for_path(&path) {
            Some(backend) => backend,
            None => {
                warn!(
                    "No drawing backend for {}; skipping report",
                    path.display()
                );
                return Ok(None);
            }
        };
        debug!("Rendering {} with {:?} backend", path.display(), backend);

        let page = self.config.page;
        let mut surface = match backend {
            Backend::Svg => match SvgSurface::create(&path, page.width, page.height) {
                Some(surface) => surface,
                None => return Ok(None),
            },
        };

        let cursor = self.render_to(&mut surface);
        info!(
            "Report laid out {:.1} of {:.1} units: {} packets, {} of {} wire bytes captured",
            cursor.offset(),
            cursor.bounds().height,
            self.packet_count,
            self.byte_count,
            self.wire_byte_count
        );
        if self.packetfall.dropped() > 0 {
            warn!(
                "Packet timeline omits {} packets past its {} event limit",
                self.packetfall.dropped(),
                crate::stats::packetfall::MAX_EVENTS
            );
        }

        surface.finish().map(Some)
    }

    /// Lay the page out on `surface` and return the final cursor
    pub fn render_to(&self, surface: &mut dyn Surface) -> LayoutCursor {
        let page = self.config.page;
        let pad_size = page.width * self.config.margin_factor;
        let pad_bounds = page.inset(pad_size);
        surface.translate(pad_bounds.x, pad_bounds.y);

        RenderPass::new(self, surface, pad_bounds).run()
    }
}
