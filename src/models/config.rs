use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::render::surface::Bounds;
use crate::utils::error::AppResult;

/// Report configuration, fixed for the whole capture session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Page rectangle in drawing units
    pub page: Bounds,

    /// Page margin as a fraction of the page width
    pub margin_factor: f64,

    /// Font size of the header block
    pub header_font_size: f64,

    /// Font size of the top-N lists under paired histograms
    pub top_list_font_size: f64,

    /// Number of top-N rows shown under each paired histogram
    pub top_n: usize,

    /// Output filename inside the output directory
    pub filename: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page: Bounds::new(0.0, 0.0, 611.0, 792.0),
            margin_factor: 0.05,
            header_font_size: 8.0,
            top_list_font_size: 8.0,
            top_n: 3,
            filename: "report.pdf".to_string(),
        }
    }
}

impl ReportConfig {
    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Like [`ReportConfig::load`], but a file that names no output file gets
    /// `fallback_filename` instead of the library default
    pub fn load_with_filename<P: AsRef<Path>>(path: P, fallback_filename: &str) -> AppResult<Self> {
        let raw = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        let names_file = value.get("filename").is_some();

        let mut config: Self = serde_json::from_value(value)?;
        if !names_file {
            config.filename = fallback_filename.to_string();
        }
        Ok(config)
    }
}
