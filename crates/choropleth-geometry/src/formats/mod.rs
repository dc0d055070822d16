mod common;
mod geojson_features;
mod map_data;

pub use geojson_features::GeoJsonFormat;
pub use map_data::MapDataCsvFormat;

pub(crate) use common::{parse_group_id, parse_optional_label, parse_required_f64};
