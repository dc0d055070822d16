use std::fs;
use std::path::{Path, PathBuf};

use choropleth_geometry::Granularity;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::render::StyleConfig;
use crate::values::TieBreak;

pub const DEFAULT_SEED: u64 = 42;

/// One pipeline run, usually read from a TOML file:
///
/// ```toml
/// granularity = "state"
/// seed = 7
/// values_path = "out/state_values.csv"
/// output_path = "out/state.png"
/// tie_break = "keep-first"
///
/// [style]
/// title = "Synthetic values by state"
/// low = "blue"
/// mid = "white"
/// high = "red"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub granularity: Granularity,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Read when the file exists; otherwise synthetic values are generated and written here.
    #[serde(default)]
    pub values_path: Option<PathBuf>,
    #[serde(default)]
    pub joined_path: Option<PathBuf>,
    pub output_path: PathBuf,
    #[serde(default)]
    pub tie_break: TieBreak,
    #[serde(default)]
    pub style: StyleConfig,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl PipelineConfig {
    pub fn new(granularity: Granularity, output_path: impl Into<PathBuf>) -> Self {
        Self {
            granularity,
            seed: DEFAULT_SEED,
            values_path: None,
            joined_path: None,
            output_path: output_path.into(),
            tie_break: TieBreak::default(),
            style: StyleConfig::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
