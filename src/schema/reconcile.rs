//! Additive schema reconciliation.
//!
//! Reconciliation only ever adds columns. Existing columns are matched by name alone
//! (case-sensitive) and are never inspected or altered, even when the sample suggests a
//! different kind.

use crate::error::IngestError;
use crate::mapping::is_reserved;
use crate::store::StoreSession;
use crate::types::{ColumnDescriptor, ColumnSet, Record};

use super::infer::infer_value;

/// Columns `sample` needs that `existing` lacks, in the sample's field order.
///
/// Kinds are inferred from the sample's values; null values infer [`crate::types::ColumnKind::Text`].
/// Reserved fields are never proposed.
pub fn reconcile(existing: &ColumnSet, sample: &Record) -> Vec<ColumnDescriptor> {
    sample
        .iter()
        .filter(|(name, _)| !is_reserved(name) && !existing.contains(name))
        .map(|(name, value)| ColumnDescriptor::new(name, infer_value(value)))
        .collect()
}

/// Result of [`provision`].
#[derive(Debug, Default)]
pub struct Provisioned {
    /// Columns created, in request order.
    pub created: Vec<ColumnDescriptor>,
    /// The first failure, if any. Columns after it were not requested.
    pub error: Option<IngestError>,
}

/// Create `columns` on `list` one at a time, stopping at the first failure.
pub fn provision<S: StoreSession>(
    session: &mut S,
    list: &S::List,
    columns: &[ColumnDescriptor],
) -> Provisioned {
    let mut out = Provisioned::default();
    for column in columns {
        if let Err(e) = session.create_column(list, column) {
            out.error = Some(IngestError::SchemaProvision {
                column: column.name.clone(),
                kind: column.kind,
                message: e.to_string(),
            });
            break;
        }
        out.created.push(column.clone());
    }
    out
}
