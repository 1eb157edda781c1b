//! Projection of input [`Record`]s onto [`StagedItem`]s.
//!
//! The mapper performs no I/O. Given a schema snapshot it:
//!
//! - skips reserved, store-assigned fields (see [`RESERVED_FIELDS`])
//! - skips null fields
//! - drops fields with no matching writable column, reporting them in [`MappedRow::dropped`]
//! - coerces everything else via [`crate::coerce::coerce`]

use crate::coerce::coerce;
use crate::types::{ColumnSet, Record, StagedItem};

/// Field names the store assigns itself. Never written, never provisioned.
pub const RESERVED_FIELDS: &[&str] = &["ID"];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// A staged item plus the input fields that could not be placed on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedRow {
    pub item: StagedItem,
    /// Fields present in the record but absent from the writable columns, in record order.
    pub dropped: Vec<String>,
}

/// Map one record onto a new [`StagedItem`] using `columns` for column kinds.
///
/// Unknown fields are dropped silently; use [`map_row_with_report`] to observe them.
pub fn map_row(record: &Record, columns: &ColumnSet) -> StagedItem {
    map_row_with_report(record, columns).item
}

/// Like [`map_row`], but also reports which fields were dropped.
pub fn map_row_with_report(record: &Record, columns: &ColumnSet) -> MappedRow {
    let mut out = MappedRow::default();
    for (name, value) in record.iter() {
        if is_reserved(name) {
            continue;
        }
        let kind = match columns.kind_of(name) {
            Some(kind) if kind.is_writable() => kind,
            _ => {
                out.dropped.push(name.to_string());
                continue;
            }
        };
        if value.is_null() {
            continue;
        }
        out.item.set(name, coerce(value, kind));
    }
    out
}
