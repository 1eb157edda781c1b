//! `list-ingest` writes loosely-typed input records into a remote list (a named, typed table of
//! items), one committed item per record.
//!
//! The primary entrypoint is [`ingestion::ingest_records`], which talks to the store through a
//! caller-supplied [`store::StoreSession`] and can:
//!
//! - create a missing list and provision columns inferred from the first record
//! - coerce every field to the wire form of its column's kind
//! - commit each record independently, reading committed items back unless quiet
//!
//! ## Column kinds
//!
//! Host value types map to a closed set of [`types::ColumnKind`]s (see [`schema::infer()`]):
//!
//! - integers of any width and floats → [`types::ColumnKind::Number`]
//! - decimals → [`types::ColumnKind::Currency`]
//! - booleans → [`types::ColumnKind::Boolean`]
//! - date/times → [`types::ColumnKind::DateTime`]
//! - UUIDs → [`types::ColumnKind::Guid`]
//! - short / long text → [`types::ColumnKind::Text`] / [`types::ColumnKind::Note`]
//! - anything else, including nulls → [`types::ColumnKind::Text`]
//!
//! ## Quick example: ingest into a new list
//!
//! ```rust
//! use list_ingest::ingestion::{ingest_records, IngestOptions};
//! use list_ingest::store::InMemoryStore;
//! use list_ingest::types::Record;
//!
//! # fn main() -> Result<(), list_ingest::IngestError> {
//! let mut store = InMemoryStore::new();
//! let records = vec![
//!     Record::new().with("Title", "Ada").with("Score", 98.5f64),
//!     Record::new().with("Title", "Grace").with("Score", 87.25f64),
//! ];
//! let opts = IngestOptions {
//!     auto_create: true,
//!     ..Default::default()
//! };
//!
//! let report = ingest_records(&mut store, "People", &records, &opts)?;
//! assert_eq!(report.committed(), 2);
//! assert_eq!(report.confirmations.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Reading input
//!
//! ```no_run
//! use list_ingest::source::{csv, json};
//!
//! # fn main() -> Result<(), list_ingest::IngestError> {
//! let from_csv = csv::records_from_path("people.csv")?;
//! let from_json = json::records_from_path("events.ndjson")?;
//! println!("rows={}", from_csv.len() + from_json.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: the ingestion driver, its options and observers
//! - [`schema`]: type inference and additive schema reconciliation
//! - [`coerce`]: per-column wire serialization
//! - [`mapping`]: record → staged item projection
//! - [`store`]: the store collaborator trait and an in-memory store
//! - [`source`]: CSV/JSON record sources
//! - [`types`]: records, values, columns and items
//! - [`error`]: error types

pub mod coerce;
pub mod error;
pub mod ingestion;
pub mod mapping;
pub mod schema;
pub mod source;
pub mod store;
pub mod types;

pub use error::{IngestError, IngestResult};
