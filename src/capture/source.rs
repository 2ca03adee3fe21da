use log::{debug, error, info};
#[cfg(feature = "live")]
use log::warn;
use pcap_file::pcap::PcapReader;
use pcap_file::DataLink;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::models::packet::{LinkType, PacketInfo, Timeval};
use crate::utils::error::{AppError, AppResult};

/// Packets read back from a classic libpcap savefile
pub struct SavefileSource {
    path: PathBuf,
    reader: PcapReader<BufReader<File>>,
    link: LinkType,
    packets_read: u64,
    finished: bool,
}

impl SavefileSource {
    /// Open a savefile and check that its link type is one we can frame
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let reader = PcapReader::new(BufReader::new(file))?;

        let link = match reader.header().datalink {
            DataLink::ETHERNET => LinkType::Ethernet,
            DataLink::RAW => LinkType::RawIp,
            other => {
                return Err(AppError::CaptureError(format!(
                    "{}: unsupported link type {:?}",
                    path.display(),
                    other
                )))
            }
        };

        info!("Reading {} ({:?} link)", path.display(), link);
        Ok(Self {
            path,
            reader,
            link,
            packets_read: 0,
            finished: false,
        })
    }

    /// Number of records returned so far
    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }
}

impl Iterator for SavefileSource {
    type Item = PacketInfo;

    fn next(&mut self) -> Option<PacketInfo> {
        if self.finished {
            return None;
        }

        match self.reader.next_packet() {
            Some(Ok(record)) => {
                self.packets_read += 1;
                Some(PacketInfo::from_frame(
                    self.link,
                    Timeval::from(record.timestamp),
                    record.orig_len,
                    &record.data,
                ))
            }
            Some(Err(e)) => {
                // A torn last record is common when a capture was killed
                error!(
                    "Stopping read of {} after {} packets: {}",
                    self.path.display(),
                    self.packets_read,
                    e
                );
                self.finished = true;
                None
            }
            None => {
                debug!("End of {} after {} packets", self.path.display(), self.packets_read);
                self.finished = true;
                None
            }
        }
    }
}

/// Packets captured from a network interface until stopped
#[cfg(feature = "live")]
pub struct LiveSource {
    interface: String,
    capture: pcap::Capture<pcap::Active>,
    link: LinkType,
    running: std::sync::Arc<std::sync::atomic::AtomicBool>,
    packets_read: u64,
}

#[cfg(feature = "live")]
impl LiveSource {
    const MAX_CONSECUTIVE_ERRORS: u32 = 5;

    /// Open `interface` in promiscuous mode, optionally with a BPF filter.
    ///
    /// Capture stops once `running` is cleared (e.g. from a Ctrl-C handler).
    pub fn open(
        interface: &str,
        filter: Option<&str>,
        running: std::sync::Arc<std::sync::atomic::AtomicBool>,
    ) -> AppResult<Self> {
        info!("Starting capture on interface: {}", interface);
        let mut capture = pcap::Capture::from_device(interface)?
            .promisc(true)
            .snaplen(65535)
            .timeout(1000)
            .open()?;

        if let Some(filter) = filter {
            info!("Applying filter: {}", filter);
            capture.filter(filter, true)?;
        }

        let link = match capture.get_datalink().0 {
            1 => LinkType::Ethernet,
            12 | 14 | 101 => LinkType::RawIp,
            other => {
                return Err(AppError::CaptureError(format!(
                    "{}: unsupported link type {}",
                    interface, other
                )))
            }
        };

        Ok(Self {
            interface: interface.to_string(),
            capture,
            link,
            running,
            packets_read: 0,
        })
    }
}

#[cfg(feature = "live")]
impl Iterator for LiveSource {
    type Item = PacketInfo;

    fn next(&mut self) -> Option<PacketInfo> {
        use std::sync::atomic::Ordering;

        let mut consecutive_errors = 0;
        while self.running.load(Ordering::SeqCst) {
            match self.capture.next_packet() {
                Ok(packet) => {
                    self.packets_read += 1;
                    let ts = Timeval::new(
                        packet.header.ts.tv_sec as i64,
                        packet.header.ts.tv_usec as i64,
                    );
                    return Some(PacketInfo::from_frame(
                        self.link,
                        ts,
                        packet.header.len,
                        packet.data,
                    ));
                }
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(e) => {
                    error!("Error capturing packet on {}: {}", self.interface, e);
                    consecutive_errors += 1;
                    if consecutive_errors >= Self::MAX_CONSECUTIVE_ERRORS {
                        warn!(
                            "Too many consecutive errors ({}), stopping capture",
                            consecutive_errors
                        );
                        return None;
                    }
                }
            }
        }

        info!(
            "Capture on {} stopped after {} packets",
            self.interface, self.packets_read
        );
        None
    }
}
