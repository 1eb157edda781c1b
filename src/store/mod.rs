//! The remote list store, as seen by the ingestion core.
//!
//! [`StoreSession`] is the one seam to the outside world: an authenticated, stateful context
//! (one per ingestion run) that the driver receives explicitly and threads through every call.
//! Establishing the session is the caller's job.
//!
//! [`memory::InMemoryStore`] is a complete in-process implementation, useful for tests and for
//! staging imports locally.

pub mod memory;

use std::fmt;

use thiserror::Error;

use crate::types::{ColumnDescriptor, ColumnSet, ItemId, Record, StagedItem};

pub use memory::{InMemoryStore, MemoryListId, StoreCall};

/// Convenience result type for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a [`StoreSession`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The referenced list or item does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },
    /// The store understood the request and refused it.
    #[error("rejected: {message}")]
    Rejected { message: String },
    /// The request did not reach the store or the response was lost.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

/// Operations the ingestion core needs from a list store.
///
/// Item creation is two-phase: [`Self::stage_new_item`] queues work on the session and
/// [`Self::commit`] flushes everything pending, returning the ids assigned to the flushed items
/// in staging order.
pub trait StoreSession {
    /// Handle to a resolved list.
    type List: Clone + fmt::Debug;

    /// Look a list up by name. `Ok(None)` means it does not exist.
    fn resolve_list(&mut self, name: &str) -> StoreResult<Option<Self::List>>;

    /// Create a new, empty list.
    fn create_list(&mut self, name: &str) -> StoreResult<Self::List>;

    /// Current columns of a list. Implementations should leave out computed columns; callers
    /// filter them again regardless.
    fn get_columns(&mut self, list: &Self::List) -> StoreResult<ColumnSet>;

    /// Add one column to a list.
    fn create_column(&mut self, list: &Self::List, column: &ColumnDescriptor) -> StoreResult<()>;

    /// Queue a new item for creation on the next [`Self::commit`].
    fn stage_new_item(&mut self, list: &Self::List, item: StagedItem) -> StoreResult<()>;

    /// Flush all pending work on this session.
    ///
    /// On failure the pending work may be discarded or kept; kept work is flushed, and its ids
    /// returned ahead of newer ones, by the next successful commit.
    fn commit(&mut self) -> StoreResult<Vec<ItemId>>;

    /// Read a committed item back.
    fn read_item(&mut self, list: &Self::List, id: &ItemId) -> StoreResult<Record>;
}
