use std::fs;

use choropleth_core::geometry::{GeometryRecord, GeometryTable, Granularity};
use choropleth_core::join::join_to_geometry;
use choropleth_core::storage::{
    parse_value_table, read_value_table, write_joined_table, write_value_table,
};
use choropleth_core::synthetic::generate_synthetic_values;
use choropleth_core::values::ValueRecord;

#[test]
fn value_table_round_trips_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/values.csv");
    let records = generate_synthetic_values(["texas", "new york", "Côte d'Ivoire"], 11);

    let written = write_value_table(&path, &records).expect("write");
    assert_eq!(written.rows, 3);

    let (read_back, stored) = read_value_table(&path).expect("read");
    assert_eq!(read_back, records);
    assert_eq!(stored.digest, written.digest);

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("region,value\n"));
}

#[test]
fn digest_tracks_content() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_value_table(&dir.path().join("a.csv"), &[ValueRecord::new("ohio", 1.0)]).unwrap();
    let b = write_value_table(&dir.path().join("b.csv"), &[ValueRecord::new("ohio", 1.0)]).unwrap();
    let c = write_value_table(&dir.path().join("c.csv"), &[ValueRecord::new("ohio", 2.0)]).unwrap();

    assert_eq!(a.digest, b.digest);
    assert_ne!(a.digest, c.digest);
}

#[test]
fn parses_hand_written_tables() {
    let content = b"region, value\nWashington, 12.5\n\"Bosnia, Herzegovina\",3\n";
    let records = parse_value_table(content).expect("parse");
    assert_eq!(
        records,
        vec![
            ValueRecord::new("Washington", 12.5),
            ValueRecord::new("Bosnia, Herzegovina", 3.0),
        ]
    );

    assert!(parse_value_table(b"region,value\nohio,not-a-number\n").is_err());
}

#[test]
fn joined_table_keeps_every_geometry_row() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![
        GeometryRecord::new("ohio", None, -84.8, 41.7, 1, 1),
        GeometryRecord::new("ohio", None, -80.5, 41.7, 1, 2),
        GeometryRecord::new("ohio", None, -80.5, 38.4, 1, 3),
        GeometryRecord::new("iowa", None, -96.6, 43.5, 2, 4),
        GeometryRecord::new("iowa", None, -90.1, 43.5, 2, 5),
        GeometryRecord::new("iowa", None, -90.1, 40.4, 2, 6),
    ];
    let geometry = GeometryTable::from_records(Granularity::State, &records).unwrap();
    let joined =
        join_to_geometry(&[ValueRecord::new("ohio", 3.0)], &geometry, Granularity::State).unwrap();

    let path = dir.path().join("joined.csv");
    write_joined_table(&path, &joined.df).expect("write joined");

    let content = fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "long,lat,group,order,region,subregion,value"
    );
    assert_eq!(lines.count(), 6);
}
