use std::hint::black_box;

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

use list_ingest::ingestion::{ingest_records, IngestOptions};
use list_ingest::mapping::map_row;
use list_ingest::store::InMemoryStore;
use list_ingest::types::{ColumnDescriptor, ColumnKind, ColumnSet, Record};

fn columns() -> ColumnSet {
    ColumnSet::new(vec![
        ColumnDescriptor::new("Title", ColumnKind::Text),
        ColumnDescriptor::new("Body", ColumnKind::Note),
        ColumnDescriptor::new("Score", ColumnKind::Number),
        ColumnDescriptor::new("Due", ColumnKind::DateTime),
        ColumnDescriptor::new("Done", ColumnKind::Boolean),
    ])
}

fn record(i: usize) -> Record {
    Record::new()
        .with("ID", i)
        .with("Title", format!("item <{i}> & co"))
        .with("Body", "lorem ipsum ".repeat(40))
        .with("Score", i as f64 * 0.5)
        .with("Due", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .with("Done", i % 2 == 0)
        .with("Unknown", "dropped")
}

fn bench_map_row(c: &mut Criterion) {
    let cols = columns();
    let rec = record(7);
    c.bench_function("map_row", |b| b.iter(|| map_row(black_box(&rec), black_box(&cols))));
}

fn bench_ingest_1k(c: &mut Criterion) {
    let records: Vec<Record> = (0..1_000).map(record).collect();
    let opts = IngestOptions {
        auto_create: true,
        quiet: true,
        ..Default::default()
    };
    c.bench_function("ingest_records_1k_in_memory", |b| {
        b.iter(|| {
            let mut store = InMemoryStore::new();
            ingest_records(&mut store, "Bench", black_box(&records), &opts).unwrap()
        })
    });
}

criterion_group!(benches, bench_map_row, bench_ingest_1k);
criterion_main!(benches);
