use std::fmt;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct FormatAttempt {
    pub format: &'static str,
    pub message: String,
}

impl FormatAttempt {
    pub fn new(format: &'static str, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
        }
    }
}

impl fmt::Display for FormatAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.format, self.message)
    }
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("{format} format mismatch: {reason}")]
    FormatMismatch {
        format: &'static str,
        reason: String,
    },

    #[error("{format} header invalid: {message}")]
    InvalidHeader {
        format: &'static str,
        message: String,
    },

    #[error("{format} CSV error: {source}")]
    Csv {
        format: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{format} record {line_index} invalid: {message}")]
    DataRow {
        format: &'static str,
        line_index: usize,
        message: String,
    },

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("geometry schema invalid: {message}")]
    Schema { message: String },

    #[error("{format} file did not contain any vertices")]
    EmptyData { format: &'static str },

    #[error("no {granularity} geometry available from {location}")]
    NotFound {
        granularity: String,
        location: String,
    },

    #[error("failed to read geometry file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no geometry format recognized this file; attempts: {attempts:?}")]
    NoMatchingFormat { attempts: Vec<FormatAttempt> },

    #[error("unsupported granularity '{0}'; expected one of state, world, county")]
    UnsupportedGranularity(String),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}
