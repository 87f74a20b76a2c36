//! Well report: layout model and PDF rendering.
//!
//! `compose` decides what goes where (pure, testable without fonts);
//! `render_pdf` paints a layout with printpdf. Text is set in an external
//! TTF so diagnosis text outside Latin-1 survives.

pub mod layout;
pub mod pdf;

pub use layout::{compose, Block, PlacedBlock, ReportLayout, ReportPage};
pub use pdf::render_pdf;

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use thiserror::Error;

pub const REPORT_TITLE: &str = "SCADA Well Report";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot read report font {path}: {source}")]
    Font {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// TTF font bytes used for every text run in the report.
#[derive(Clone)]
pub struct ReportFont {
    bytes: Vec<u8>,
}

impl ReportFont {
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let bytes = std::fs::read(path).map_err(|source| ReportError::Font {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Loaded report font");
        Ok(Self { bytes })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for ReportFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportFont")
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// `SCADA_Report_<input>_<YYYYmmdd_HHMMSS>.pdf`, with the user's input
/// reduced to filename-safe characters.
pub fn report_filename<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut safe: String = input
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if safe.chars().all(|c| c == '_') {
        safe = "well".to_string();
    }
    format!("SCADA_Report_{safe}_{}.pdf", now.format("%Y%m%d_%H%M%S"))
}
