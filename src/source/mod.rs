//! Record sources.
//!
//! Turn tabular or structured input into [`crate::types::Record`]s for
//! [`crate::ingestion::ingest_records`]:
//!
//! - [`csv`]: headered CSV, every cell as text
//! - [`json`]: a JSON array of objects, a single object, or NDJSON

pub mod csv;
pub mod json;
