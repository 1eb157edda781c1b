//! Ingestion entrypoints.
//!
//! Most callers should use [`ingest_records`] (from [`driver`]) which:
//!
//! - resolves (or creates) the target list and optionally provisions missing columns
//! - maps, stages and commits every record as its own item
//! - optionally reports failures, warnings and alerts to an [`IngestObserver`]

pub mod driver;
pub mod observability;

pub use driver::{
    ingest_records, DroppedField, ErrorMode, IngestOptions, IngestReport, IngestRequest, LateCommit,
    RowFailurePolicy,
};
pub use observability::{
    severity_for_error, CompositeObserver, FileObserver, IngestContext, IngestObserver, IngestSeverity,
    IngestStats, StdErrObserver, TracingObserver,
};
