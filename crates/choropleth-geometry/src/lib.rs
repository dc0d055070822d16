pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::{FormatAttempt, GeometryError};
pub use model::{GeometryRecord, GeometryTable, Granularity, GEOMETRY_COLUMNS};
pub use registry::{
    load_geometry, load_with_formats, DirectoryGeometryProvider, GeometryFormat, GeometryProvider,
    InMemoryGeometryProvider,
};
