//! Minimal polygon-fill renderer for joined choropleth records.
//!
//! Groups are drawn in first-seen order, each as one closed ring in the vertex order the
//! geometry provider gave. Fill color comes from a [`ColorScale`] over the joined values, with
//! the missing color for regions that received no value.

pub mod projection;
pub mod raster;
pub mod scale;
pub mod style;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use choropleth_geometry::Granularity;
use tracing::{info, warn};

use crate::error::{ChoroplethError, Result};
use crate::join::JoinedRecord;
use crate::storage::ensure_parent_dir;

pub use projection::Projection;
pub use raster::Canvas;
pub use scale::ColorScale;
pub use style::{Color, ProjectionChoice, SizeUnit, StyleConfig};

const MARGIN: i64 = 10;
const LEGEND_BAR_WIDTH: i64 = 16;
const LEGEND_GAP: i64 = 12;
const LEGEND_SWATCH: i64 = 16;
const GRATICULE_STEP_DEGREES: f64 = 10.0;
const GRATICULE_COLOR: Color = Color::rgb(220, 220, 220);
const FRAME_COLOR: Color = Color::rgb(0, 0, 0);

/// Turns joined records into image bytes.
pub trait MapRenderer {
    fn name(&self) -> &'static str;
    fn render(
        &self,
        records: &[JoinedRecord],
        granularity: Granularity,
        style: &StyleConfig,
    ) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PngRenderer;

impl MapRenderer for PngRenderer {
    fn name(&self) -> &'static str {
        "png"
    }

    fn render(
        &self,
        records: &[JoinedRecord],
        granularity: Granularity,
        style: &StyleConfig,
    ) -> Result<Vec<u8>> {
        let canvas = rasterize(records, granularity, style)?;
        canvas.to_png(style.title.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub groups: usize,
    pub missing_groups: usize,
    pub bytes: usize,
}

pub fn render_png(
    records: &[JoinedRecord],
    granularity: Granularity,
    style: &StyleConfig,
) -> Result<Vec<u8>> {
    PngRenderer.render(records, granularity, style)
}

pub fn render_to_file(
    records: &[JoinedRecord],
    granularity: Granularity,
    style: &StyleConfig,
    path: &Path,
) -> Result<RenderSummary> {
    render_to_file_with(&PngRenderer, records, granularity, style, path)
}

pub fn render_to_file_with(
    renderer: &dyn MapRenderer,
    records: &[JoinedRecord],
    granularity: Granularity,
    style: &StyleConfig,
    path: &Path,
) -> Result<RenderSummary> {
    let bytes = renderer.render(records, granularity, style)?;
    ensure_parent_dir(path)?;
    fs::write(path, &bytes)?;

    let (width, height) = style.pixel_size()?;
    let groups = group_rings(records);
    let summary = RenderSummary {
        path: path.to_path_buf(),
        width,
        height,
        groups: groups.len(),
        missing_groups: groups.iter().filter(|group| group.value.is_none()).count(),
        bytes: bytes.len(),
    };
    info!(
        renderer = renderer.name(),
        path = %path.display(),
        width,
        height,
        groups = summary.groups,
        missing_groups = summary.missing_groups,
        "map rendered"
    );
    Ok(summary)
}

/// One polygon ring: its vertices in provider order and the value of its region.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub group_id: i64,
    pub value: Option<f64>,
    pub vertices: Vec<(f64, f64)>,
}

/// Groups records by `group_id` without reordering groups or vertices.
pub fn group_rings(records: &[JoinedRecord]) -> Vec<Ring> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut rings: Vec<Ring> = Vec::new();

    for record in records {
        let group_id = record.geometry.group_id;
        let slot = *index.entry(group_id).or_insert_with(|| {
            rings.push(Ring {
                group_id,
                value: record.value,
                vertices: Vec::new(),
            });
            rings.len() - 1
        });
        let ring = &mut rings[slot];
        if ring.value.is_none() {
            ring.value = record.value;
        }
        ring.vertices
            .push((record.geometry.longitude, record.geometry.latitude));
    }

    rings
}

struct PlotArea {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

pub fn rasterize(
    records: &[JoinedRecord],
    granularity: Granularity,
    style: &StyleConfig,
) -> Result<Canvas> {
    if records.is_empty() {
        return Err(ChoroplethError::Render(
            "no joined records to draw".to_string(),
        ));
    }
    if let Some([a, b]) = style.limits {
        if !(a.is_finite() && b.is_finite()) {
            return Err(ChoroplethError::Render(format!(
                "scale limits must be finite, got [{a}, {b}]"
            )));
        }
    }
    if let Some(midpoint) = style.midpoint {
        if !midpoint.is_finite() {
            return Err(ChoroplethError::Render(format!(
                "scale midpoint must be finite, got {midpoint}"
            )));
        }
    }
    if let Some(record) = records.iter().find(|record| {
        !(record.geometry.longitude.is_finite() && record.geometry.latitude.is_finite())
    }) {
        return Err(ChoroplethError::Render(format!(
            "vertex {} of group {} has non-finite coordinates ({}, {})",
            record.geometry.order,
            record.geometry.group_id,
            record.geometry.longitude,
            record.geometry.latitude
        )));
    }

    let (width, height) = style.pixel_size()?;
    let legend_space = if style.show_legend {
        LEGEND_BAR_WIDTH + LEGEND_GAP
    } else {
        0
    };
    let area = PlotArea {
        x: MARGIN,
        y: MARGIN,
        width: width as i64 - 2 * MARGIN - legend_space,
        height: height as i64 - 2 * MARGIN,
    };
    if area.width < 1 || area.height < 1 {
        return Err(ChoroplethError::Render(format!(
            "{width}x{height} px leaves no room for the map"
        )));
    }

    let projection = style.projection.resolve(granularity);
    let (min_lat, max_lat) = records.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), record| (lo.min(record.geometry.latitude), hi.max(record.geometry.latitude)),
    );
    let reference_lat = (min_lat + max_lat) / 2.0;

    let rings = group_rings(records);
    let projected: Vec<Vec<(f64, f64)>> = rings
        .iter()
        .map(|ring| {
            ring.vertices
                .iter()
                .map(|&(lon, lat)| projection.project(lon, lat, reference_lat))
                .collect()
        })
        .collect();

    let fit = Fit::new(projected.iter().flatten().copied(), &area);
    let scale = ColorScale::from_values(style, records.iter().filter_map(|record| record.value));
    if let Some(requested) = style.midpoint.filter(|&midpoint| midpoint != scale.midpoint) {
        warn!(
            requested,
            min = scale.min,
            max = scale.max,
            used = scale.midpoint,
            "scale midpoint lies outside the value range and was clamped"
        );
    }

    let mut canvas = Canvas::new(width, height, style.background);

    if style.show_axes {
        draw_graticule(&mut canvas, records, projection, reference_lat, &fit);
    }

    let screen: Vec<Vec<(f64, f64)>> = projected
        .iter()
        .map(|ring| ring.iter().map(|&point| fit.apply(point)).collect())
        .collect();

    for (ring, points) in rings.iter().zip(&screen) {
        canvas.fill_polygon(points, scale.color_for(ring.value));
    }
    if let Some(border) = style.border {
        for points in &screen {
            canvas.stroke_ring(points, border);
        }
    }

    if style.show_axes {
        let right = (area.x + area.width - 1) as f64;
        let bottom = (area.y + area.height - 1) as f64;
        let left = area.x as f64;
        let top = area.y as f64;
        canvas.stroke_ring(&[(left, top), (right, top), (right, bottom), (left, bottom)], FRAME_COLOR);
    }

    if style.show_legend {
        let any_missing = rings.iter().any(|ring| ring.value.is_none());
        draw_legend(&mut canvas, &area, &scale, any_missing);
    }

    Ok(canvas)
}

/// Uniform scale from projected coordinates into the plot area, centered, y flipped.
struct Fit {
    min_x: f64,
    max_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Fit {
    fn new(points: impl Iterator<Item = (f64, f64)>, area: &PlotArea) -> Self {
        let (min_x, max_x, min_y, max_y) = points.fold(
            (
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
            ),
            |(min_x, max_x, min_y, max_y), (x, y)| {
                (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
            },
        );
        let span_x = (max_x - min_x).max(f64::EPSILON);
        let span_y = (max_y - min_y).max(f64::EPSILON);
        let scale = (area.width as f64 / span_x).min(area.height as f64 / span_y);

        Self {
            min_x,
            max_y,
            scale,
            offset_x: area.x as f64 + (area.width as f64 - span_x * scale) / 2.0,
            offset_y: area.y as f64 + (area.height as f64 - span_y * scale) / 2.0,
        }
    }

    fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (
            self.offset_x + (x - self.min_x) * self.scale,
            self.offset_y + (self.max_y - y) * self.scale,
        )
    }
}

fn draw_graticule(
    canvas: &mut Canvas,
    records: &[JoinedRecord],
    projection: Projection,
    reference_lat: f64,
    fit: &Fit,
) {
    let (min_lon, max_lon, min_lat, max_lat) = records.iter().fold(
        (
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ),
        |(a, b, c, d), record| {
            let (lon, lat) = (record.geometry.longitude, record.geometry.latitude);
            (a.min(lon), b.max(lon), c.min(lat), d.max(lat))
        },
    );

    let to_screen = |lon: f64, lat: f64| fit.apply(projection.project(lon, lat, reference_lat));

    let mut lon = (min_lon / GRATICULE_STEP_DEGREES).ceil() * GRATICULE_STEP_DEGREES;
    while lon <= max_lon {
        canvas.draw_line(to_screen(lon, min_lat), to_screen(lon, max_lat), GRATICULE_COLOR);
        lon += GRATICULE_STEP_DEGREES;
    }

    let mut lat = (min_lat / GRATICULE_STEP_DEGREES).ceil() * GRATICULE_STEP_DEGREES;
    while lat <= max_lat {
        canvas.draw_line(to_screen(min_lon, lat), to_screen(max_lon, lat), GRATICULE_COLOR);
        lat += GRATICULE_STEP_DEGREES;
    }
}

/// Vertical color bar right of the plot area, high values on top, plus a missing swatch.
fn draw_legend(canvas: &mut Canvas, area: &PlotArea, scale: &ColorScale, any_missing: bool) {
    let x = area.x + area.width + LEGEND_GAP;
    let bar_height = if any_missing {
        (area.height - LEGEND_SWATCH - LEGEND_GAP).max(1)
    } else {
        area.height
    };

    for row in 0..bar_height {
        let t = if bar_height > 1 {
            1.0 - row as f64 / (bar_height - 1) as f64
        } else {
            1.0
        };
        let value = scale.min + t * (scale.max - scale.min);
        canvas.fill_rect(x, area.y + row, LEGEND_BAR_WIDTH, 1, scale.color_for(Some(value)));
    }
    let (left, top) = (x as f64, area.y as f64);
    let (right, bottom) = (
        (x + LEGEND_BAR_WIDTH - 1) as f64,
        (area.y + bar_height - 1) as f64,
    );
    canvas.stroke_ring(&[(left, top), (right, top), (right, bottom), (left, bottom)], FRAME_COLOR);

    if any_missing {
        let swatch_y = area.y + area.height - LEGEND_SWATCH;
        canvas.fill_rect(x, swatch_y, LEGEND_BAR_WIDTH, LEGEND_SWATCH, scale.missing);
        let top = swatch_y as f64;
        let bottom = (swatch_y + LEGEND_SWATCH - 1) as f64;
        canvas.stroke_ring(&[(left, top), (right, top), (right, bottom), (left, bottom)], FRAME_COLOR);
    }
}
