use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::{FormatAttempt, GeometryError};
use crate::formats::{GeoJsonFormat, MapDataCsvFormat};
use crate::model::{GeometryTable, Granularity};

pub trait GeometryFormat {
    fn name(&self) -> &'static str;
    fn load(&self, content: &str, granularity: Granularity) -> Result<GeometryTable, GeometryError>;
}

/// Source of the full vertex table for a granularity. No partial results.
pub trait GeometryProvider {
    fn name(&self) -> &str;
    fn load(&self, granularity: Granularity) -> Result<GeometryTable, GeometryError>;
}

pub fn load_geometry(content: &str, granularity: Granularity) -> Result<GeometryTable, GeometryError> {
    let map_data = MapDataCsvFormat;
    let geojson = GeoJsonFormat;
    let formats: [&dyn GeometryFormat; 2] = [&map_data, &geojson];
    load_with_formats(content, granularity, &formats)
}

pub fn load_with_formats(
    content: &str,
    granularity: Granularity,
    formats: &[&dyn GeometryFormat],
) -> Result<GeometryTable, GeometryError> {
    let mut attempts = Vec::new();

    for format in formats {
        match format.load(content, granularity) {
            Ok(table) => return Ok(table),
            Err(GeometryError::FormatMismatch { reason, .. }) => {
                attempts.push(FormatAttempt::new(format.name(), reason));
            }
            Err(err) => return Err(err),
        }
    }

    Err(GeometryError::NoMatchingFormat { attempts })
}

/// Reads `<root>/<granularity>.csv`, falling back to `.geojson` and `.json`.
#[derive(Debug, Clone)]
pub struct DirectoryGeometryProvider {
    root: PathBuf,
}

impl DirectoryGeometryProvider {
    const EXTENSIONS: [&'static str; 3] = ["csv", "geojson", "json"];

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, granularity: Granularity) -> Option<PathBuf> {
        Self::EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", granularity.as_str(), ext)))
            .find(|path| path.is_file())
    }
}

impl GeometryProvider for DirectoryGeometryProvider {
    fn name(&self) -> &str {
        "directory"
    }

    fn load(&self, granularity: Granularity) -> Result<GeometryTable, GeometryError> {
        let path = self
            .path_for(granularity)
            .ok_or_else(|| GeometryError::NotFound {
                granularity: granularity.to_string(),
                location: self.root.display().to_string(),
            })?;

        let content = fs::read_to_string(&path).map_err(|source| GeometryError::Io {
            path: path.clone(),
            source,
        })?;

        let table = load_geometry(&content, granularity)?;
        info!(
            path = %path.display(),
            granularity = %granularity,
            vertices = table.height(),
            "geometry loaded"
        );
        Ok(table)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryGeometryProvider {
    tables: HashMap<Granularity, GeometryTable>,
}

impl InMemoryGeometryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: GeometryTable) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, table: GeometryTable) {
        self.tables.insert(table.granularity(), table);
    }
}

impl GeometryProvider for InMemoryGeometryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn load(&self, granularity: Granularity) -> Result<GeometryTable, GeometryError> {
        self.tables
            .get(&granularity)
            .cloned()
            .ok_or_else(|| GeometryError::NotFound {
                granularity: granularity.to_string(),
                location: self.name().to_string(),
            })
    }
}
