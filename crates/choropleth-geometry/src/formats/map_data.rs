use csv::StringRecord;
use tracing::debug;

use crate::errors::GeometryError;
use crate::model::{GeometryTable, Granularity, VertexColumns};
use crate::registry::GeometryFormat;

use super::{parse_group_id, parse_optional_label, parse_required_f64};

/// Vertex-per-row CSV in the `map_data` layout:
/// `long,lat,group,order,region,subregion`, optionally preceded by a row-index column.
pub struct MapDataCsvFormat;

impl Default for MapDataCsvFormat {
    fn default() -> Self {
        Self
    }
}

struct ColumnIndex {
    long: usize,
    lat: usize,
    group: usize,
    order: usize,
    region: usize,
    subregion: Option<usize>,
}

impl MapDataCsvFormat {
    const NAME: &'static str = "MAP_DATA_CSV";

    fn index_columns(header: &StringRecord) -> Result<ColumnIndex, GeometryError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|column| column.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| GeometryError::FormatMismatch {
                format: Self::NAME,
                reason: format!("header is missing column '{name}'"),
            })
        };

        let index = ColumnIndex {
            long: require("long")?,
            lat: require("lat")?,
            group: require("group")?,
            order: require("order")?,
            region: require("region")?,
            subregion: find("subregion"),
        };

        let mut positions = vec![
            index.long,
            index.lat,
            index.group,
            index.order,
            index.region,
        ];
        positions.extend(index.subregion);
        positions.sort_unstable();
        if positions.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(GeometryError::InvalidHeader {
                format: Self::NAME,
                message: "geometry columns must be distinct".to_string(),
            });
        }

        Ok(index)
    }
}

impl GeometryFormat for MapDataCsvFormat {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn load(&self, content: &str, granularity: Granularity) -> Result<GeometryTable, GeometryError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(content.as_bytes());

        let header = reader
            .headers()
            .map_err(|err| GeometryError::FormatMismatch {
                format: Self::NAME,
                reason: format!("unreadable header row: {err}"),
            })?
            .clone();
        let index = Self::index_columns(&header)?;

        let mut columns = VertexColumns::default();
        for (row_idx, record) in reader.records().enumerate() {
            let line_index = row_idx + 2;
            let record = record.map_err(|err| GeometryError::Csv {
                format: Self::NAME,
                source: err,
            })?;

            let field = |idx: usize| record.get(idx).unwrap_or("");

            let long = parse_required_f64(Self::NAME, field(index.long), line_index, "long")?;
            let lat = parse_required_f64(Self::NAME, field(index.lat), line_index, "lat")?;
            let group = parse_group_id(Self::NAME, field(index.group), line_index, "group")?;
            let order = parse_group_id(Self::NAME, field(index.order), line_index, "order")?;
            let region = parse_optional_label(field(index.region)).ok_or_else(|| {
                GeometryError::DataRow {
                    format: Self::NAME,
                    line_index,
                    message: "column 'region' is empty".to_string(),
                }
            })?;
            let subregion = index
                .subregion
                .and_then(|idx| parse_optional_label(field(idx)));

            columns.push(long, lat, group, order, region, subregion);
        }

        if columns.is_empty() {
            return Err(GeometryError::EmptyData { format: Self::NAME });
        }

        debug!(
            format = Self::NAME,
            granularity = %granularity,
            vertices = columns.len(),
            "loaded map_data geometry"
        );
        GeometryTable::new(granularity, columns.into_frame()?)
    }
}
