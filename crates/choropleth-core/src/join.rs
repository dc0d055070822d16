use std::collections::{HashMap, HashSet};

use choropleth_geometry::{GeometryRecord, GeometryTable, Granularity};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ChoroplethError, Result};
use crate::keys::{case_folded, normalize_key};
use crate::values::ValueRecord;

pub const VALUE_COLUMN: &str = "value";

/// Coverage diagnostics of one join. Incomplete coverage is expected and never fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinReport {
    pub granularity: Granularity,
    pub geometry_rows: usize,
    pub matched_rows: usize,
    pub unmatched_geometry_rows: usize,
    pub unmatched_geometry_regions: Vec<String>,
    pub value_rows: usize,
    pub unmatched_value_keys: Vec<String>,
}

impl JoinReport {
    pub fn is_complete(&self) -> bool {
        self.unmatched_geometry_rows == 0
    }

    /// Share of geometry vertices that received a value.
    pub fn coverage(&self) -> f64 {
        if self.geometry_rows == 0 {
            return 0.0;
        }
        self.matched_rows as f64 / self.geometry_rows as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub geometry: GeometryRecord,
    pub value: Option<f64>,
}

/// Geometry frame with the appended nullable `value` column.
#[derive(Debug, Clone)]
pub struct JoinOutput {
    pub granularity: Granularity,
    pub df: DataFrame,
    pub report: JoinReport,
}

impl JoinOutput {
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn records(&self) -> Result<Vec<JoinedRecord>> {
        let geometry = GeometryTable::new(self.granularity, self.df.clone())?.records()?;
        let values = self
            .df
            .column(VALUE_COLUMN)?
            .as_materialized_series()
            .f64()?;

        Ok(geometry
            .into_iter()
            .enumerate()
            .map(|(idx, geometry)| JoinedRecord {
                geometry,
                value: values.get(idx),
            })
            .collect())
    }
}

/// Geometry-anchored join of `values` onto `geometry`.
///
/// Every geometry row comes out exactly once, in input order. Rows without a value get a null.
/// Value rows without geometry are dropped and listed in the report, unless they differ from a
/// provider key only by case, which fails with [`ChoroplethError::KeyMismatch`].
pub fn join_to_geometry(
    values: &[ValueRecord],
    geometry: &GeometryTable,
    granularity: Granularity,
) -> Result<JoinOutput> {
    if geometry.granularity() != granularity {
        return Err(ChoroplethError::GranularityMismatch {
            requested: granularity,
            geometry: geometry.granularity(),
        });
    }

    let mut lookup: HashMap<String, f64> = HashMap::with_capacity(values.len());
    let mut value_keys: Vec<String> = Vec::with_capacity(values.len());
    for record in values {
        let key = normalize_key(&record.region_name, granularity);
        match lookup.get(&key) {
            Some(&existing) if existing != record.value => {
                return Err(ChoroplethError::DuplicateRegion {
                    key,
                    first: existing,
                    second: record.value,
                });
            }
            Some(_) => {}
            None => {
                lookup.insert(key.clone(), record.value);
                value_keys.push(key);
            }
        }
    }

    let df = geometry.df();
    let keys = df
        .column(granularity.key_column())?
        .as_materialized_series()
        .str()?;

    let mut joined_values: Vec<Option<f64>> = Vec::with_capacity(df.height());
    let mut geometry_keys: HashSet<&str> = HashSet::new();
    let mut unmatched_regions: Vec<String> = Vec::new();
    let mut matched_rows = 0usize;

    for idx in 0..df.height() {
        let key = keys.get(idx);
        let value = key.and_then(|key| lookup.get(key).copied());

        if let Some(key) = key {
            if geometry_keys.insert(key) && value.is_none() {
                unmatched_regions.push(key.to_string());
            }
        }
        if value.is_some() {
            matched_rows += 1;
        }
        joined_values.push(value);
    }

    let unmatched_value_keys: Vec<String> = value_keys
        .into_iter()
        .filter(|key| !geometry_keys.contains(key.as_str()))
        .collect();

    if !unmatched_value_keys.is_empty() {
        let folded: HashMap<String, &str> = geometry_keys
            .iter()
            .map(|key| (case_folded(key), *key))
            .collect();
        let mismatched: Vec<String> = unmatched_value_keys
            .iter()
            .filter_map(|key| {
                folded
                    .get(&case_folded(key))
                    .map(|provider_key| format!("'{key}' (provider key '{provider_key}')"))
            })
            .collect();
        if !mismatched.is_empty() {
            return Err(ChoroplethError::KeyMismatch {
                granularity,
                keys: mismatched,
            });
        }
    }

    let mut joined = df.clone();
    joined.with_column(Series::new(VALUE_COLUMN.into(), joined_values))?;

    let report = JoinReport {
        granularity,
        geometry_rows: df.height(),
        matched_rows,
        unmatched_geometry_rows: df.height() - matched_rows,
        unmatched_geometry_regions: unmatched_regions,
        value_rows: values.len(),
        unmatched_value_keys,
    };

    if !report.is_complete() {
        warn!(
            granularity = %granularity,
            unmatched_vertices = report.unmatched_geometry_rows,
            unmatched_regions = report.unmatched_geometry_regions.len(),
            "incomplete coverage; regions without values render as missing"
        );
    }
    if !report.unmatched_value_keys.is_empty() {
        warn!(
            granularity = %granularity,
            count = report.unmatched_value_keys.len(),
            keys = ?report.unmatched_value_keys,
            "value rows matched no geometry and were excluded"
        );
    }
    debug!(
        granularity = %granularity,
        geometry_rows = report.geometry_rows,
        matched_rows = report.matched_rows,
        "joined values onto geometry"
    );

    Ok(JoinOutput {
        granularity,
        df: joined,
        report,
    })
}
