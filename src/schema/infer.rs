//! Host type to column kind mapping.

use crate::types::{ColumnKind, HostType, Value};

/// Map a host type to the column kind that stores it.
///
/// Total and deterministic. Types without a dedicated kind (including [`HostType::Null`], whose
/// real type cannot be observed) fall back to [`ColumnKind::Text`].
pub fn infer(host: HostType) -> ColumnKind {
    match host {
        HostType::Float32 | HostType::Float64 => ColumnKind::Number,
        HostType::Int8
        | HostType::Int16
        | HostType::Int32
        | HostType::Int64
        | HostType::UInt8
        | HostType::UInt16
        | HostType::UInt32
        | HostType::UInt64 => ColumnKind::Number,
        HostType::Decimal => ColumnKind::Currency,
        HostType::Bool => ColumnKind::Boolean,
        HostType::DateTime => ColumnKind::DateTime,
        HostType::Guid => ColumnKind::Guid,
        HostType::Utf8 => ColumnKind::Text,
        HostType::LargeUtf8 => ColumnKind::Note,
        _ => ColumnKind::Text,
    }
}

/// Shorthand for `infer(value.host_type())`.
pub fn infer_value(value: &Value) -> ColumnKind {
    infer(value.host_type())
}
