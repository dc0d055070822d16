use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::GeometryError;

/// Column layout of every geometry frame, in order.
pub const GEOMETRY_COLUMNS: [&str; 6] = ["long", "lat", "group", "order", "region", "subregion"];

/// Administrative level of the regions being mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Granularity {
    State,
    World,
    County,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::State, Granularity::World, Granularity::County];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::State => "state",
            Granularity::World => "world",
            Granularity::County => "county",
        }
    }

    /// Geometry column the join key is matched against.
    pub fn key_column(&self) -> &'static str {
        match self {
            Granularity::State | Granularity::World => "region",
            Granularity::County => "subregion",
        }
    }

    /// Country names keep their provider casing; state and county names are lowercase.
    pub fn lowercases_keys(&self) -> bool {
        !matches!(self, Granularity::World)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = GeometryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "state" | "states" => Ok(Granularity::State),
            "world" | "country" | "countries" => Ok(Granularity::World),
            "county" | "counties" => Ok(Granularity::County),
            _ => Err(GeometryError::UnsupportedGranularity(value.to_string())),
        }
    }
}

impl TryFrom<&str> for Granularity {
    type Error = GeometryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Granularity {
    type Error = GeometryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One polygon vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    pub region: String,
    pub subregion: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub group_id: i64,
    pub order: i64,
}

impl GeometryRecord {
    pub fn new(
        region: impl Into<String>,
        subregion: Option<String>,
        longitude: f64,
        latitude: f64,
        group_id: i64,
        order: i64,
    ) -> Self {
        Self {
            region: region.into(),
            subregion,
            longitude,
            latitude,
            group_id,
            order,
        }
    }
}

/// Vertex columns accumulated by the format loaders before the frame is built.
#[derive(Debug, Clone, Default)]
pub(crate) struct VertexColumns {
    pub long: Vec<f64>,
    pub lat: Vec<f64>,
    pub group: Vec<i64>,
    pub order: Vec<i64>,
    pub region: Vec<String>,
    pub subregion: Vec<Option<String>>,
}

impl VertexColumns {
    pub fn push(
        &mut self,
        long: f64,
        lat: f64,
        group: i64,
        order: i64,
        region: &str,
        subregion: Option<&str>,
    ) {
        self.long.push(long);
        self.lat.push(lat);
        self.group.push(group);
        self.order.push(order);
        self.region.push(region.to_string());
        self.subregion.push(subregion.map(str::to_string));
    }

    pub fn len(&self) -> usize {
        self.long.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long.is_empty()
    }

    pub fn into_frame(self) -> Result<DataFrame, GeometryError> {
        let columns: Vec<Column> = vec![
            Series::new("long".into(), self.long).into(),
            Series::new("lat".into(), self.lat).into(),
            Series::new("group".into(), self.group).into(),
            Series::new("order".into(), self.order).into(),
            Series::new("region".into(), self.region).into(),
            Series::new("subregion".into(), self.subregion).into(),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

/// Geometry frame for one granularity, validated against [`GEOMETRY_COLUMNS`].
#[derive(Debug, Clone)]
pub struct GeometryTable {
    granularity: Granularity,
    df: DataFrame,
}

impl GeometryTable {
    pub fn new(granularity: Granularity, df: DataFrame) -> Result<Self, GeometryError> {
        let df = conform_schema(df, granularity)?;
        Ok(Self { granularity, df })
    }

    pub fn from_records(
        granularity: Granularity,
        records: &[GeometryRecord],
    ) -> Result<Self, GeometryError> {
        let mut columns = VertexColumns::default();
        for record in records {
            columns.push(
                record.longitude,
                record.latitude,
                record.group_id,
                record.order,
                &record.region,
                record.subregion.as_deref(),
            );
        }
        Self::new(granularity, columns.into_frame()?)
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.is_empty()
    }

    /// Distinct join keys for this granularity, in first-seen order.
    pub fn region_keys(&self) -> Result<Vec<String>, GeometryError> {
        let keys = self
            .df
            .column(self.granularity.key_column())?
            .as_materialized_series()
            .str()?;

        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for key in keys.into_iter().flatten() {
            if seen.insert(key) {
                ordered.push(key.to_string());
            }
        }
        Ok(ordered)
    }

    pub fn records(&self) -> Result<Vec<GeometryRecord>, GeometryError> {
        let long = self.df.column("long")?.as_materialized_series().f64()?;
        let lat = self.df.column("lat")?.as_materialized_series().f64()?;
        let group = self.df.column("group")?.as_materialized_series().i64()?;
        let order = self.df.column("order")?.as_materialized_series().i64()?;
        let region = self.df.column("region")?.as_materialized_series().str()?;
        let subregion = self.df.column("subregion")?.as_materialized_series().str()?;

        let mut records = Vec::with_capacity(self.df.height());
        for idx in 0..self.df.height() {
            let (Some(longitude), Some(latitude), Some(group_id), Some(order), Some(region)) = (
                long.get(idx),
                lat.get(idx),
                group.get(idx),
                order.get(idx),
                region.get(idx),
            ) else {
                return Err(GeometryError::Schema {
                    message: format!("row {idx} has a null geometry field"),
                });
            };
            records.push(GeometryRecord {
                region: region.to_string(),
                subregion: subregion.get(idx).map(str::to_string),
                longitude,
                latitude,
                group_id,
                order,
            });
        }
        Ok(records)
    }
}

fn conform_schema(mut df: DataFrame, granularity: Granularity) -> Result<DataFrame, GeometryError> {
    for name in &GEOMETRY_COLUMNS[..5] {
        if df.column(name).is_err() {
            return Err(GeometryError::Schema {
                message: format!("missing required column '{name}'"),
            });
        }
    }

    if df.column("subregion").is_err() {
        let nulls: Vec<Option<&str>> = vec![None; df.height()];
        df.with_column(Series::new("subregion".into(), nulls))?;
    }

    let expected = [
        ("long", DataType::Float64),
        ("lat", DataType::Float64),
        ("group", DataType::Int64),
        ("order", DataType::Int64),
        ("region", DataType::String),
        ("subregion", DataType::String),
    ];

    let mut columns = Vec::with_capacity(expected.len());
    for (name, dtype) in expected.iter() {
        let column = df
            .column(name)?
            .cast(dtype)
            .map_err(|err| GeometryError::Schema {
                message: format!("column '{name}' cannot be read as {dtype}: {err}"),
            })?;
        columns.push(column);
    }
    let conformed = DataFrame::new(columns)?;

    for name in &GEOMETRY_COLUMNS[..5] {
        let nulls = conformed.column(name)?.null_count();
        if nulls > 0 {
            return Err(GeometryError::Schema {
                message: format!("column '{name}' contains {nulls} null or unparseable values"),
            });
        }
    }

    for name in ["long", "lat"] {
        let coordinates = conformed.column(name)?.as_materialized_series().f64()?;
        if let Some((idx, value)) = coordinates
            .into_iter()
            .enumerate()
            .find_map(|(idx, value)| value.filter(|v| !v.is_finite()).map(|v| (idx, v)))
        {
            return Err(GeometryError::Schema {
                message: format!("column '{name}' must be finite, row {idx} holds {value}"),
            });
        }
    }

    if granularity == Granularity::County {
        let nulls = conformed.column("subregion")?.null_count();
        if nulls > 0 {
            return Err(GeometryError::Schema {
                message: format!(
                    "county geometry requires a subregion on every vertex; {nulls} are missing"
                ),
            });
        }
    }

    Ok(conformed)
}
