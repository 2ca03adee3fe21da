use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use pcapreport::capture::source::SavefileSource;
use pcapreport::utils::logging;
use pcapreport::{OnePageReport, PacketInfo, ReportConfig};

/// Output filename used when neither `--filename` nor the config file names one
const DEFAULT_FILENAME: &str = "report.svg";

#[derive(Parser, Debug)]
#[clap(author, version, about = "One-page visual summary of a packet capture")]
struct Args {
    /// Capture savefile to read
    input: Option<PathBuf>,

    /// Network interface to capture from instead of a savefile
    #[clap(short, long)]
    interface: Option<String>,

    /// Directory the report is written to
    #[clap(short, long, default_value = ".")]
    outdir: PathBuf,

    /// Report filename; the extension selects the drawing backend
    /// [default: the config file's, else report.svg]
    #[clap(short, long)]
    filename: Option<String>,

    /// JSON file with report settings
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many packets
    #[clap(long)]
    count: Option<usize>,

    /// BPF filter expression (live capture only)
    #[clap(long)]
    filter: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logger(logging::get_log_level(&args.log_level));

    info!("Starting pcapreport v{}", env!("CARGO_PKG_VERSION"));

    let config = report_config(&args)?;

    let limit = args.count.unwrap_or(usize::MAX);
    let report = match (&args.input, &args.interface) {
        (Some(input), None) => {
            if args.filter.is_some() {
                warn!("--filter only applies to live capture; ignoring it");
            }
            let source = SavefileSource::open(input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            build_report(input.display().to_string(), config, source.take(limit))
        }
        (None, Some(interface)) => live_report(interface, &args, config, limit)?,
        (Some(_), Some(_)) => bail!("Give either a savefile or --interface, not both"),
        (None, None) => bail!("Nothing to read: give a savefile or --interface"),
    };

    info!(
        "Ingested {} packets ({} bytes captured, {} on the wire) from {}",
        report.packet_count(),
        report.byte_count(),
        report.wire_byte_count(),
        report.source_identifier()
    );

    match report
        .render(&args.outdir)
        .context("Failed to write report")?
    {
        Some(path) => info!("Report written to {}", path.display()),
        None => warn!("No report produced"),
    }

    Ok(())
}

/// Settings from `--config` (or defaults), with `--filename` taking precedence
fn report_config(args: &Args) -> Result<ReportConfig> {
    let mut config = match &args.config {
        Some(path) => ReportConfig::load_with_filename(path, DEFAULT_FILENAME)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ReportConfig {
            filename: DEFAULT_FILENAME.to_string(),
            ..ReportConfig::default()
        },
    };
    if let Some(filename) = &args.filename {
        config.filename = filename.clone();
    }
    Ok(config)
}

fn build_report(
    source_identifier: String,
    config: ReportConfig,
    packets: impl Iterator<Item = PacketInfo>,
) -> OnePageReport {
    let mut report = OnePageReport::new(source_identifier, config);
    for packet in packets {
        report.ingest(&packet);
    }
    report
}

#[cfg(feature = "live")]
fn live_report(
    interface: &str,
    args: &Args,
    config: ReportConfig,
    limit: usize,
) -> Result<OnePageReport> {
    use pcapreport::capture::source::LiveSource;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    let source = LiveSource::open(interface, args.filter.as_deref(), running)
        .with_context(|| format!("Failed to open capture on {}", interface))?;
    info!("Capturing on {}; press Ctrl-C to stop", interface);

    Ok(build_report(interface.to_string(), config, source.take(limit)))
}

#[cfg(not(feature = "live"))]
fn live_report(
    interface: &str,
    _args: &Args,
    _config: ReportConfig,
    _limit: usize,
) -> Result<OnePageReport> {
    bail!(
        "Cannot capture from {}: built without the `live` feature",
        interface
    )
}
