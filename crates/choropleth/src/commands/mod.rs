pub mod generate;
pub mod join;
pub mod regions;
pub mod render;

use std::path::Path;

use anyhow::{bail, Result};
use choropleth_core::geometry::DirectoryGeometryProvider;
use choropleth_core::join::JoinReport;
use comfy_table::{presets::UTF8_FULL, Table};

pub fn provider(root: &Path) -> Result<DirectoryGeometryProvider> {
    if !root.is_dir() {
        bail!("geometry directory {} does not exist", root.display());
    }
    Ok(DirectoryGeometryProvider::new(root))
}

pub fn report_table(report: &JoinReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["", "rows", "detail"]);
    table.add_row(vec![
        "geometry".to_string(),
        report.geometry_rows.to_string(),
        report.granularity.to_string(),
    ]);
    table.add_row(vec![
        "matched".to_string(),
        report.matched_rows.to_string(),
        format!("{:.1}% coverage", report.coverage() * 100.0),
    ]);
    table.add_row(vec![
        "unmatched geometry".to_string(),
        report.unmatched_geometry_rows.to_string(),
        summarize(&report.unmatched_geometry_regions),
    ]);
    table.add_row(vec![
        "values".to_string(),
        report.value_rows.to_string(),
        String::new(),
    ]);
    table.add_row(vec![
        "unmatched values".to_string(),
        report.unmatched_value_keys.len().to_string(),
        summarize(&report.unmatched_value_keys),
    ]);
    table
}

fn summarize(keys: &[String]) -> String {
    const SHOWN: usize = 8;
    match keys.len() {
        0 => String::new(),
        n if n <= SHOWN => keys.join(", "),
        n => format!("{}, ... ({} more)", keys[..SHOWN].join(", "), n - SHOWN),
    }
}
