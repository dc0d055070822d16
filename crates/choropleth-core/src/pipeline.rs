use std::path::PathBuf;

use choropleth_geometry::{GeometryProvider, GeometryTable, Granularity};
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::join::{join_to_geometry, JoinReport};
use crate::render::{render_to_file_with, MapRenderer, PngRenderer};
use crate::storage::{read_value_table, write_joined_table, write_value_table};
use crate::synthetic::generate_synthetic_values;
use crate::values::{deduplicate_regions, ValueRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Loaded,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub granularity: Granularity,
    pub value_source: ValueSource,
    pub value_rows: usize,
    pub values_digest: Option<String>,
    pub report: JoinReport,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

pub fn run_pipeline(config: &PipelineConfig, provider: &dyn GeometryProvider) -> Result<PipelineOutcome> {
    run_pipeline_with(config, provider, &PngRenderer)
}

/// Load geometry, obtain values, deduplicate, join, render. Structural errors abort before
/// anything is drawn; incomplete coverage only shows up in the report.
pub fn run_pipeline_with(
    config: &PipelineConfig,
    provider: &dyn GeometryProvider,
    renderer: &dyn MapRenderer,
) -> Result<PipelineOutcome> {
    let granularity = config.granularity;
    let geometry = provider.load(granularity)?;
    info!(
        provider = provider.name(),
        granularity = %granularity,
        vertices = geometry.height(),
        "pipeline geometry ready"
    );

    let (values, value_source, values_digest) = obtain_values(config, &geometry)?;
    let deduplicated = deduplicate_regions(&values, granularity, config.tie_break)?;
    let joined = join_to_geometry(&deduplicated, &geometry, granularity)?;

    if let Some(path) = &config.joined_path {
        write_joined_table(path, &joined.df)?;
    }

    let records = joined.records()?;
    let summary = render_to_file_with(
        renderer,
        &records,
        granularity,
        &config.style,
        &config.output_path,
    )?;

    Ok(PipelineOutcome {
        granularity,
        value_source,
        value_rows: values.len(),
        values_digest,
        report: joined.report,
        output_path: summary.path,
        width: summary.width,
        height: summary.height,
    })
}

fn obtain_values(
    config: &PipelineConfig,
    geometry: &GeometryTable,
) -> Result<(Vec<ValueRecord>, ValueSource, Option<String>)> {
    if let Some(path) = config.values_path.as_deref().filter(|path| path.is_file()) {
        let (records, stored) = read_value_table(path)?;
        return Ok((records, ValueSource::Loaded, Some(stored.digest)));
    }

    let records = generate_synthetic_values(geometry.region_keys()?, config.seed);
    info!(
        rows = records.len(),
        seed = config.seed,
        "generated synthetic values"
    );

    let digest = match &config.values_path {
        Some(path) => Some(write_value_table(path, &records)?.digest),
        None => None,
    };
    Ok((records, ValueSource::Generated, digest))
}
