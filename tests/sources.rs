use list_ingest::ingestion::{ingest_records, IngestOptions};
use list_ingest::source::{csv, json};
use list_ingest::store::InMemoryStore;
use list_ingest::types::{ColumnKind, Value};

#[test]
fn csv_fixture_reads_every_cell_as_text() {
    let records = csv::records_from_path("tests/fixtures/people.csv").unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].field_names().collect::<Vec<_>>(),
        vec!["Title", "Score", "Active", "Notes"]
    );
    assert_eq!(records[0].get("Score"), Some(&Value::text("98.5")));
    assert_eq!(records[1].get("Notes"), Some(&Value::Null));
}

#[test]
fn ndjson_fixture_keeps_field_order_and_types() {
    let records = json::records_from_path("tests/fixtures/people.ndjson").unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].field_names().collect::<Vec<_>>(),
        vec!["Title", "Score", "Active", "Visits"]
    );
    assert_eq!(records[0].get("Visits"), Some(&Value::Int64(3)));
    assert_eq!(records[1].get("Visits"), Some(&Value::Null));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = json::records_from_path("tests/fixtures/does_not_exist.json").unwrap_err();
    assert!(err.to_string().starts_with("io error"));
}

#[test]
fn json_records_provision_typed_columns() {
    let records = json::records_from_path("tests/fixtures/people.ndjson").unwrap();
    let mut store = InMemoryStore::new();
    let opts = IngestOptions {
        auto_create: true,
        ..Default::default()
    };

    let report = ingest_records(&mut store, "People", &records, &opts).unwrap();

    assert_eq!(report.committed(), 2);
    assert_eq!(report.columns.kind_of("Score"), Some(ColumnKind::Number));
    assert_eq!(report.columns.kind_of("Active"), Some(ColumnKind::Boolean));
    assert_eq!(report.columns.kind_of("Visits"), Some(ColumnKind::Number));
}

#[test]
fn csv_records_provision_text_columns_and_keep_markup() {
    let records = csv::records_from_path("tests/fixtures/people.csv").unwrap();
    let mut store = InMemoryStore::new();
    let opts = IngestOptions {
        auto_create: true,
        ..Default::default()
    };

    let report = ingest_records(&mut store, "People", &records, &opts).unwrap();

    assert_eq!(report.columns.kind_of("Score"), Some(ColumnKind::Text));
    assert_eq!(
        store.items("People")[0].get("Notes"),
        Some(&Value::text("likes <angle> brackets & ampersands"))
    );
}
