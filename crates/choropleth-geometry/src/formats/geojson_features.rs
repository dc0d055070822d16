use geojson::{Feature, GeoJson, Value as GeoJsonValue};
use serde_json::Value;
use tracing::debug;

use crate::errors::GeometryError;
use crate::model::{GeometryTable, Granularity, VertexColumns};
use crate::registry::GeometryFormat;

/// GeoJSON `FeatureCollection` (or single `Feature`) of `Polygon` / `MultiPolygon` features.
///
/// Every ring becomes its own group. Group ids and vertex order count up across the whole
/// file so the result lines up with the `map_data` layout.
pub struct GeoJsonFormat;

impl Default for GeoJsonFormat {
    fn default() -> Self {
        Self
    }
}

struct RingCursor {
    next_group: i64,
    next_order: i64,
}

impl GeoJsonFormat {
    const NAME: &'static str = "GEOJSON";
    const REGION_PROPERTIES: [&'static str; 2] = ["region", "name"];
    const SUBREGION_PROPERTIES: [&'static str; 1] = ["subregion"];

    fn property<'a>(feature: &'a Feature, keys: &[&str]) -> Option<&'a str> {
        let properties = feature.properties.as_ref()?;
        keys.iter().find_map(|key| match properties.get(*key) {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim()),
            _ => None,
        })
    }

    fn push_polygon(
        rings: &[Vec<Vec<f64>>],
        region: &str,
        subregion: Option<&str>,
        feature_index: usize,
        cursor: &mut RingCursor,
        columns: &mut VertexColumns,
    ) -> Result<(), GeometryError> {
        for ring in rings {
            let group = cursor.next_group;
            cursor.next_group += 1;
            for position in ring {
                let (Some(&long), Some(&lat)) = (position.first(), position.get(1)) else {
                    return Err(GeometryError::DataRow {
                        format: Self::NAME,
                        line_index: feature_index,
                        message: "position has fewer than two coordinates".to_string(),
                    });
                };
                columns.push(long, lat, group, cursor.next_order, region, subregion);
                cursor.next_order += 1;
            }
        }
        Ok(())
    }

    fn geometry_kind(value: &GeoJsonValue) -> &'static str {
        match value {
            GeoJsonValue::Point(_) => "Point",
            GeoJsonValue::MultiPoint(_) => "MultiPoint",
            GeoJsonValue::LineString(_) => "LineString",
            GeoJsonValue::MultiLineString(_) => "MultiLineString",
            GeoJsonValue::Polygon(_) => "Polygon",
            GeoJsonValue::MultiPolygon(_) => "MultiPolygon",
            GeoJsonValue::GeometryCollection(_) => "GeometryCollection",
        }
    }
}

impl GeometryFormat for GeoJsonFormat {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn load(&self, content: &str, granularity: Granularity) -> Result<GeometryTable, GeometryError> {
        let trimmed = content.trim_start();
        if !trimmed.starts_with('{') {
            return Err(GeometryError::FormatMismatch {
                format: Self::NAME,
                reason: "content is not a JSON object".to_string(),
            });
        }

        let features = match trimmed.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => {
                return Err(GeometryError::FormatMismatch {
                    format: Self::NAME,
                    reason: "bare geometry has no region property; expected features".to_string(),
                });
            }
        };

        let mut columns = VertexColumns::default();
        let mut cursor = RingCursor {
            next_group: 1,
            next_order: 1,
        };

        for (feature_index, feature) in features.iter().enumerate() {
            let region = Self::property(feature, &Self::REGION_PROPERTIES).ok_or_else(|| {
                GeometryError::DataRow {
                    format: Self::NAME,
                    line_index: feature_index,
                    message: "feature is missing a 'region' (or 'name') property".to_string(),
                }
            })?;
            let subregion = Self::property(feature, &Self::SUBREGION_PROPERTIES);
            let geometry = feature
                .geometry
                .as_ref()
                .ok_or_else(|| GeometryError::DataRow {
                    format: Self::NAME,
                    line_index: feature_index,
                    message: format!("feature '{region}' has no geometry"),
                })?;

            match &geometry.value {
                GeoJsonValue::Polygon(rings) => Self::push_polygon(
                    rings,
                    region,
                    subregion,
                    feature_index,
                    &mut cursor,
                    &mut columns,
                )?,
                GeoJsonValue::MultiPolygon(polygons) => {
                    for rings in polygons {
                        Self::push_polygon(
                            rings,
                            region,
                            subregion,
                            feature_index,
                            &mut cursor,
                            &mut columns,
                        )?;
                    }
                }
                other => {
                    return Err(GeometryError::DataRow {
                        format: Self::NAME,
                        line_index: feature_index,
                        message: format!(
                            "feature '{region}' has unsupported geometry type {}",
                            Self::geometry_kind(other)
                        ),
                    });
                }
            }
        }

        if columns.is_empty() {
            return Err(GeometryError::EmptyData { format: Self::NAME });
        }

        debug!(
            format = Self::NAME,
            granularity = %granularity,
            features = features.len(),
            vertices = columns.len(),
            "loaded GeoJSON geometry"
        );
        GeometryTable::new(granularity, columns.into_frame()?)
    }
}
