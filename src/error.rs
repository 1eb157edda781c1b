use thiserror::Error;

use crate::store::StoreError;
use crate::types::{ColumnKind, ItemId};

/// Convenience result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Error type returned by ingestion functions.
///
/// Shared by the ingestion driver, the schema reconciler and the record sources.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The target list does not exist and auto-creation is disabled.
    #[error("list not found: '{list}'")]
    ListNotFound { list: String },

    /// The store refused to create a column during schema provisioning.
    #[error("failed to provision column '{column}' as {kind}: {message}")]
    SchemaProvision {
        column: String,
        kind: ColumnKind,
        message: String,
    },

    /// Staging or committing a single row failed. Scoped to that row.
    #[error("failed to commit row {row}: {message}")]
    RowCommit { row: usize, message: String },

    /// An input field has no matching writable column and was left out of the item.
    #[error("row {row}: field '{field}' has no matching column and was dropped")]
    UnknownFieldDropped { row: usize, field: String },

    /// A row reported as failed was committed anyway when a later commit flushed its pending work.
    #[error("row {row}: item {item_id} was committed by a later flush after its commit failed")]
    CommittedAfterFailure { row: usize, item_id: ItemId },

    /// Any other store collaborator failure (resolving, listing columns, reading back items).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Underlying I/O error (e.g. input file not found).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV input error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Input records could not be read (malformed JSON, non-object rows, etc.).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}
