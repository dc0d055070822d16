use std::fs;
use std::path::PathBuf;

use choropleth_core::error::ChoroplethError;
use choropleth_core::geometry::{load_geometry, GeometryRecord, GeometryTable, Granularity};
use choropleth_core::join::{join_to_geometry, VALUE_COLUMN};
use choropleth_core::synthetic::generate_synthetic_values;
use choropleth_core::values::ValueRecord;

fn fixture(name: &str) -> GeometryTable {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../choropleth-geometry/tests/data")
        .join(name);
    let content = fs::read_to_string(&path).expect("read fixture");
    let granularity = name
        .split('.')
        .next()
        .and_then(|stem| stem.parse::<Granularity>().ok())
        .expect("fixture named after granularity");
    load_geometry(&content, granularity).expect("load fixture")
}

fn texas_square() -> GeometryTable {
    let records = vec![
        GeometryRecord::new("texas", None, -106.0, 36.0, 1, 1),
        GeometryRecord::new("texas", None, -94.0, 36.0, 1, 2),
        GeometryRecord::new("texas", None, -94.0, 26.0, 1, 3),
        GeometryRecord::new("texas", None, -106.0, 26.0, 1, 4),
    ];
    GeometryTable::from_records(Granularity::State, &records).expect("texas square")
}

#[test]
fn texas_square_receives_its_value_on_every_vertex() {
    let geometry = texas_square();
    let joined = join_to_geometry(&[ValueRecord::new("texas", 42.0)], &geometry, Granularity::State)
        .expect("join");

    assert_eq!(joined.height(), 4);
    let records = joined.records().unwrap();
    assert!(records.iter().all(|r| r.value == Some(42.0)));
    assert!(records.iter().all(|r| r.geometry.group_id == 1));
    let orders: Vec<i64> = records.iter().map(|r| r.geometry.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4]);
    assert!(joined.report.is_complete());
    assert_eq!(joined.report.coverage(), 1.0);
}

#[test]
fn texas_square_without_values_keeps_every_vertex_as_missing() {
    let geometry = texas_square();
    let joined = join_to_geometry(&[], &geometry, Granularity::State).expect("join");

    assert_eq!(joined.height(), 4);
    assert_eq!(joined.df.column(VALUE_COLUMN).unwrap().null_count(), 4);
    assert_eq!(joined.report.unmatched_geometry_rows, 4);
    assert_eq!(joined.report.unmatched_geometry_regions, vec!["texas"]);
}

#[test]
fn join_preserves_geometry_height_for_every_granularity() {
    for name in ["state.csv", "world.csv", "county.csv"] {
        let geometry = fixture(name);
        let granularity = geometry.granularity();
        let mut keys = geometry.region_keys().unwrap();
        keys.truncate(2);
        keys.push("atlantis".to_string());
        let values = generate_synthetic_values(&keys, 3);

        let joined = join_to_geometry(&values, &geometry, granularity).expect("join");
        assert_eq!(joined.height(), geometry.height(), "{name}");
        assert_eq!(joined.report.unmatched_value_keys, vec!["atlantis"], "{name}");
    }
}

#[test]
fn join_keeps_vertex_order_within_groups() {
    let geometry = fixture("state.csv");
    let values = vec![ValueRecord::new("Michigan", 5.0), ValueRecord::new("ohio", 9.0)];
    let joined = join_to_geometry(&values, &geometry, Granularity::State).expect("join");

    let before = geometry.records().unwrap();
    let after = joined.records().unwrap();
    assert_eq!(before.len(), after.len());
    for (original, joined) in before.iter().zip(&after) {
        assert_eq!(original, &joined.geometry);
    }

    let michigan: Vec<_> = after
        .iter()
        .filter(|r| r.geometry.region == "michigan")
        .collect();
    assert_eq!(michigan.len(), 8);
    assert!(michigan.iter().all(|r| r.value == Some(5.0)));
    assert_eq!(joined.report.matched_rows, 12);
}

#[test]
fn world_join_keeps_country_casing() {
    let geometry = fixture("world.csv");
    let values = vec![ValueRecord::new("France", 12.5)];
    let joined = join_to_geometry(&values, &geometry, Granularity::World).expect("join");

    let france: Vec<_> = joined
        .records()
        .unwrap()
        .into_iter()
        .filter(|r| r.geometry.region == "France")
        .collect();
    assert_eq!(france.len(), 7);
    assert!(france.iter().all(|r| r.value == Some(12.5)));
    assert!(joined.report.unmatched_value_keys.is_empty());
}

#[test]
fn lowercased_country_names_are_a_key_mismatch() {
    let geometry = fixture("world.csv");
    let values = vec![ValueRecord::new("france", 12.5), ValueRecord::new("Spain", 3.0)];
    let err = join_to_geometry(&values, &geometry, Granularity::World).unwrap_err();

    match err {
        ChoroplethError::KeyMismatch { granularity, keys } => {
            assert_eq!(granularity, Granularity::World);
            assert_eq!(keys.len(), 1);
            assert!(keys[0].contains("France"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn county_join_matches_on_subregion() {
    let geometry = fixture("county.csv");
    let values = vec![ValueRecord::new("Jefferson", 70.0)];
    let joined = join_to_geometry(&values, &geometry, Granularity::County).expect("join");

    let matched: Vec<_> = joined
        .records()
        .unwrap()
        .into_iter()
        .filter(|r| r.value.is_some())
        .map(|r| r.geometry.region)
        .collect();
    assert_eq!(matched.len(), 8);
    assert!(matched.iter().any(|region| region == "colorado"));
    assert!(matched.iter().any(|region| region == "texas"));
    assert_eq!(joined.report.unmatched_geometry_regions, vec!["denver", "boulder"]);
}

#[test]
fn granularity_mismatch_is_rejected() {
    let geometry = fixture("county.csv");
    let err = join_to_geometry(&[ValueRecord::new("colorado", 1.0)], &geometry, Granularity::State)
        .unwrap_err();
    assert!(matches!(
        err,
        ChoroplethError::GranularityMismatch {
            requested: Granularity::State,
            geometry: Granularity::County,
        }
    ));
}

#[test]
fn conflicting_rows_reaching_the_join_are_rejected() {
    let geometry = texas_square();
    let values = vec![ValueRecord::new("texas", 1.0), ValueRecord::new("Texas", 2.0)];
    let err = join_to_geometry(&values, &geometry, Granularity::State).unwrap_err();
    assert!(matches!(err, ChoroplethError::DuplicateRegion { .. }));

    let identical = vec![ValueRecord::new("texas", 1.0), ValueRecord::new("Texas", 1.0)];
    let joined = join_to_geometry(&identical, &geometry, Granularity::State).expect("join");
    assert_eq!(joined.height(), 4);
}
