//! Well sensor dataset: loading, identifier normalization, row lookup.
//!
//! The dataset is a read-only snapshot of a CSV file. Each login takes its
//! own snapshot, so a file edited on disk is picked up by the next session
//! without affecting sessions already in flight.

pub mod dataset;
pub mod normalize;

pub use dataset::{format_reading, Dataset, SensorRecord, REQUIRED_COLUMNS};
pub use normalize::normalize_well_id;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Cannot read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset is missing required column: {0}")]
    MissingColumn(&'static str),
}
