//! One-page visual summary of a packet capture.
//!
//! Packets are folded into a [`OnePageReport`] one at a time; once the capture
//! is over the report is laid out onto a single page.

pub mod capture;
pub mod models;
pub mod render;
pub mod report;
pub mod stats;
pub mod utils;

pub use models::config::ReportConfig;
pub use models::packet::{LinkType, PacketInfo, Timeval};
pub use report::OnePageReport;
