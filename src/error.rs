use std::path::PathBuf;
use thiserror::Error;

use crate::geom::Shape;
use crate::validation::ValidationReport;

/// The main error type for bactmeasure operations.
///
/// Only setup and I/O failures end up here. Degenerate objects (empty
/// shells, unlinked foci, bacteria without relations) are part of the data
/// model and never surface as errors.
#[derive(Debug, Error)]
pub enum BactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse image JSON from {path}: {source}")]
    ImageJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write image JSON to {path}: {source}")]
    ImageJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse configuration {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid configuration: {error_count} error(s) and {warning_count} warning(s)")]
    InvalidConfig {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Volume data has {found} values but its shape needs {expected}")]
    VolumeSize { expected: usize, found: usize },

    #[error("{what} has shape {found}, expected {expected}")]
    ShapeMismatch {
        what: String,
        expected: Shape,
        found: Shape,
    },

    #[error("Image '{image}' has no channel named '{channel}'")]
    MissingChannel { image: String, channel: String },

    #[error("Failed to write results to {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Logger setup failed: {0}")]
    Logger(#[from] flexi_logger::FlexiLoggerError),
}
