use std::fs;

use choropleth_core::error::ChoroplethError;
use choropleth_core::geometry::{GeometryRecord, GeometryTable, Granularity};
use choropleth_core::join::{join_to_geometry, JoinedRecord};
use choropleth_core::render::{
    group_rings, rasterize, render_png, render_to_file, Color, Projection, SizeUnit, StyleConfig,
};
use choropleth_core::values::ValueRecord;

fn texas_records(values: &[ValueRecord]) -> Vec<JoinedRecord> {
    let records = vec![
        GeometryRecord::new("texas", None, -106.0, 36.0, 1, 1),
        GeometryRecord::new("texas", None, -94.0, 36.0, 1, 2),
        GeometryRecord::new("texas", None, -94.0, 26.0, 1, 3),
        GeometryRecord::new("texas", None, -106.0, 26.0, 1, 4),
    ];
    let geometry = GeometryTable::from_records(Granularity::State, &records).unwrap();
    join_to_geometry(values, &geometry, Granularity::State)
        .unwrap()
        .records()
        .unwrap()
}

fn small_style() -> StyleConfig {
    StyleConfig {
        width: 200.0,
        height: 100.0,
        unit: SizeUnit::Px,
        show_legend: false,
        show_axes: false,
        border: None,
        ..StyleConfig::default()
    }
}

fn decode(bytes: &[u8]) -> (png::OutputInfo, Vec<u8>, Vec<(String, String)>) {
    let decoder = png::Decoder::new(bytes);
    let mut reader = decoder.read_info().expect("png header");
    let texts = reader
        .info()
        .uncompressed_latin1_text
        .iter()
        .map(|chunk| (chunk.keyword.clone(), chunk.text.clone()))
        .collect();
    let mut buffer = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buffer).expect("png frame");
    (info, buffer, texts)
}

fn pixel(info: &png::OutputInfo, buffer: &[u8], x: u32, y: u32) -> [u8; 4] {
    let idx = (y as usize * info.width as usize + x as usize) * 4;
    [buffer[idx], buffer[idx + 1], buffer[idx + 2], buffer[idx + 3]]
}

#[test]
fn missing_region_is_drawn_in_the_missing_color() {
    let style = StyleConfig {
        missing: "#ff0000".parse().unwrap(),
        ..small_style()
    };
    let bytes = render_png(&texas_records(&[]), Granularity::State, &style).expect("render");

    let (info, buffer, _) = decode(&bytes);
    assert_eq!((info.width, info.height), (200, 100));
    assert_eq!(pixel(&info, &buffer, 100, 50), [255, 0, 0, 255]);
    assert_eq!(pixel(&info, &buffer, 1, 1), [255, 255, 255, 255]);
}

#[test]
fn single_valued_region_uses_the_mid_color() {
    let style = StyleConfig {
        mid: Color::rgb(0, 255, 0),
        title: Some("Texas only".to_string()),
        ..small_style()
    };
    let records = texas_records(&[ValueRecord::new("texas", 42.0)]);
    let bytes = render_png(&records, Granularity::State, &style).expect("render");

    let (info, buffer, texts) = decode(&bytes);
    assert_eq!(pixel(&info, &buffer, 100, 50), [0, 255, 0, 255]);
    assert!(texts
        .iter()
        .any(|(keyword, text)| keyword == "Title" && text == "Texas only"));
}

#[test]
fn legend_and_axes_fit_inside_the_image() {
    let style = StyleConfig {
        show_legend: true,
        show_axes: true,
        border: Some(Color::rgb(0, 0, 0)),
        ..small_style()
    };
    let canvas = rasterize(&texas_records(&[]), Granularity::State, &style).expect("rasterize");
    assert_eq!((canvas.width(), canvas.height()), (200, 100));
    // Missing swatch sits at the bottom of the legend column.
    assert_eq!(canvas.pixel(180, 80), Some(style.missing));
}

#[test]
fn nothing_to_draw_is_an_error() {
    let err = render_png(&[], Granularity::State, &small_style()).unwrap_err();
    assert!(matches!(err, ChoroplethError::Render(_)));

    let bad_limits = StyleConfig {
        limits: Some([0.0, f64::INFINITY]),
        ..small_style()
    };
    assert!(render_png(&texas_records(&[]), Granularity::State, &bad_limits).is_err());
}

#[test]
fn invalid_midpoint_and_coordinates_are_rejected() {
    let nan_midpoint = StyleConfig {
        midpoint: Some(f64::NAN),
        ..small_style()
    };
    let err = render_png(&texas_records(&[]), Granularity::State, &nan_midpoint).unwrap_err();
    assert!(matches!(err, ChoroplethError::Render(message) if message.contains("midpoint")));

    let mut records = texas_records(&[]);
    records[1].geometry.longitude = f64::INFINITY;
    let with_axes = StyleConfig {
        show_axes: true,
        ..small_style()
    };
    let err = rasterize(&records, Granularity::State, &with_axes).unwrap_err();
    assert!(matches!(err, ChoroplethError::Render(message) if message.contains("non-finite")));
}

#[test]
fn out_of_range_midpoint_is_clamped_into_the_limits() {
    let style = StyleConfig {
        limits: Some([0.0, 10.0]),
        midpoint: Some(50.0),
        high: Color::rgb(255, 0, 0),
        ..small_style()
    };
    let records = texas_records(&[ValueRecord::new("texas", 10.0)]);
    let canvas = rasterize(&records, Granularity::State, &style).expect("rasterize");
    // The midpoint clamps to 10, so the top of the range takes the mid color.
    assert_eq!(canvas.pixel(100, 50), Some(style.mid));
}

#[test]
fn render_to_file_writes_the_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("maps/texas.png");
    let summary =
        render_to_file(&texas_records(&[]), Granularity::State, &small_style(), &path).unwrap();

    assert_eq!(summary.groups, 1);
    assert_eq!(summary.missing_groups, 1);
    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), summary.bytes);
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn rings_follow_group_order() {
    let records = vec![
        GeometryRecord::new("michigan", None, -86.0, 45.0, 5, 1),
        GeometryRecord::new("michigan", None, -84.0, 45.0, 5, 2),
        GeometryRecord::new("michigan", None, -85.0, 46.0, 5, 3),
        GeometryRecord::new("ohio", None, -84.0, 41.0, 2, 4),
        GeometryRecord::new("ohio", None, -81.0, 41.0, 2, 5),
        GeometryRecord::new("ohio", None, -82.0, 39.0, 2, 6),
    ];
    let geometry = GeometryTable::from_records(Granularity::State, &records).unwrap();
    let joined = join_to_geometry(&[ValueRecord::new("ohio", 1.0)], &geometry, Granularity::State)
        .unwrap()
        .records()
        .unwrap();

    let rings = group_rings(&joined);
    assert_eq!(rings.iter().map(|r| r.group_id).collect::<Vec<_>>(), vec![5, 2]);
    assert_eq!(rings[0].value, None);
    assert_eq!(rings[1].value, Some(1.0));
    assert_eq!(rings[1].vertices[0], (-84.0, 41.0));
}

#[test]
fn pixel_size_respects_units() {
    let inches = StyleConfig::default();
    assert_eq!(inches.pixel_size().unwrap(), (800, 500));

    let centimeters = StyleConfig {
        width: 2.54,
        height: 5.08,
        unit: SizeUnit::Cm,
        dpi: 72.0,
        ..StyleConfig::default()
    };
    assert_eq!(centimeters.pixel_size().unwrap(), (72, 144));

    let zero_dpi = StyleConfig {
        dpi: 0.0,
        ..StyleConfig::default()
    };
    assert!(zero_dpi.pixel_size().is_err());
}

#[test]
fn colors_parse_from_names_and_hex() {
    assert_eq!("steelblue".parse::<Color>().unwrap(), Color::rgb(70, 130, 180));
    assert_eq!("#FF8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
    assert_eq!(
        "#00000080".parse::<Color>().unwrap(),
        Color::rgba(0, 0, 0, 128)
    );
    assert!("#12345".parse::<Color>().is_err());
    assert!("chartreuse-ish".parse::<Color>().is_err());
    assert_eq!(Color::rgb(255, 128, 0).to_hex(), "#ff8000");
}

#[test]
fn world_maps_default_to_quickmap() {
    let style = StyleConfig::default();
    assert_eq!(style.projection.resolve(Granularity::World), Projection::Quickmap);
    assert_eq!(style.projection.resolve(Granularity::County), Projection::Mercator);

    let (x, y) = Projection::Quickmap.project(10.0, 20.0, 60.0);
    assert!((x - 5.0).abs() < 1e-9);
    assert_eq!(y, 20.0);
}
