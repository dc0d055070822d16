use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::error::{ChoroplethError, Result};
use crate::values::ValueRecord;

/// A value table as it exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValueTable {
    pub path: PathBuf,
    pub rows: usize,
    /// blake3 digest of the file bytes.
    pub digest: String,
}

pub fn write_value_table(path: &Path, records: &[ValueRecord]) -> Result<StoredValueTable> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ChoroplethError::Io(err.into_error()))?;

    ensure_parent_dir(path)?;
    fs::write(path, &bytes)?;

    let stored = StoredValueTable {
        path: path.to_path_buf(),
        rows: records.len(),
        digest: blake3::hash(&bytes).to_hex().to_string(),
    };
    info!(
        path = %path.display(),
        rows = stored.rows,
        digest = %stored.digest,
        "value table written"
    );
    Ok(stored)
}

pub fn read_value_table(path: &Path) -> Result<(Vec<ValueRecord>, StoredValueTable)> {
    let bytes = fs::read(path)?;
    let records = parse_value_table(&bytes)?;
    let stored = StoredValueTable {
        path: path.to_path_buf(),
        rows: records.len(),
        digest: blake3::hash(&bytes).to_hex().to_string(),
    };
    info!(
        path = %path.display(),
        rows = stored.rows,
        digest = %stored.digest,
        "value table read"
    );
    Ok((records, stored))
}

/// Parses `region,value` CSV content with a header row.
pub fn parse_value_table(content: &[u8]) -> Result<Vec<ValueRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let records = reader
        .deserialize::<ValueRecord>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    Ok(records)
}

/// Writes a joined frame (geometry columns plus `value`) as CSV. Null values are empty cells.
pub fn write_joined_table(path: &Path, df: &DataFrame) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut file = fs::File::create(path)?;
    let mut frame = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)?;
    info!(path = %path.display(), rows = frame.height(), "joined table written");
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
