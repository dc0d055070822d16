pub mod config;
pub mod error;
pub mod join;
pub mod keys;
pub mod pipeline;
pub mod render;
pub mod storage;
pub mod synthetic;
pub mod values;

pub use choropleth_geometry as geometry;
pub use choropleth_geometry::Granularity;
