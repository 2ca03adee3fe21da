use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Initialize the logger with a timestamped one-line format.
///
/// Dependencies are held at `Warn` so that `trace` on this crate stays readable.
pub fn init_logger(level: LevelFilter) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, level.min(LevelFilter::Warn))
        .filter(Some(env!("CARGO_CRATE_NAME")), level)
        .init();
}

/// Get log level from string
pub fn get_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_names() {
        assert_eq!(get_log_level("TRACE"), LevelFilter::Trace);
        assert_eq!(get_log_level("warn"), LevelFilter::Warn);
        assert_eq!(get_log_level("off"), LevelFilter::Off);
        assert_eq!(get_log_level("verbose"), LevelFilter::Info);
    }
}
