// crates/choropleth-core/src/error.rs

use choropleth_geometry::{GeometryError, Granularity};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChoroplethError {
    #[error("{granularity} join keys do not follow the provider's naming convention: {keys:?}")]
    KeyMismatch {
        granularity: Granularity,
        keys: Vec<String>,
    },

    #[error("region '{key}' has conflicting values {first} and {second}")]
    DuplicateRegion { key: String, first: f64, second: f64 },

    #[error("cannot join {requested} values against {geometry} geometry")]
    GranularityMismatch {
        requested: Granularity,
        geometry: Granularity,
    },

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Rendering failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, ChoroplethError>;
