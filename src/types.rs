//! Core data model types for list ingestion.
//!
//! Input rows are loosely-typed [`Record`]s of host [`Value`]s. The remote list describes its shape
//! as a [`ColumnSet`] of [`ColumnDescriptor`]s, and each row is written as a [`StagedItem`] of
//! already-serialized [`WireValue`]s.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IngestError;

/// Longest text, in characters, that still counts as short text.
///
/// Longer strings are classified as [`HostType::LargeUtf8`] and map to [`ColumnKind::Note`].
pub const TEXT_MAX_CHARS: usize = 255;

/// Tag identifying the host type of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostType {
    Null,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal,
    DateTime,
    Guid,
    Utf8,
    LargeUtf8,
    Binary,
}

/// A date/time as supplied by the host.
///
/// Naive values carry no zone and are interpreted as local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostDateTime {
    Utc(DateTime<Utc>),
    Offset(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl fmt::Display for HostDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Offset(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Naive(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A single host-typed scalar value in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// Fixed-point decimal.
    Decimal(Decimal),
    DateTime(HostDateTime),
    Guid(Uuid),
    /// Short UTF-8 text.
    Utf8(String),
    /// Long UTF-8 text (more than [`TEXT_MAX_CHARS`] characters).
    LargeUtf8(String),
    /// Opaque bytes. Has no column kind of its own.
    Binary(Vec<u8>),
}

impl Value {
    /// Build a text value, classifying it as short or long text by length.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.chars().count() > TEXT_MAX_CHARS {
            Self::LargeUtf8(s)
        } else {
            Self::Utf8(s)
        }
    }

    /// Returns the host type tag of this value.
    pub fn host_type(&self) -> HostType {
        match self {
            Self::Null => HostType::Null,
            Self::Bool(_) => HostType::Bool,
            Self::Int8(_) => HostType::Int8,
            Self::Int16(_) => HostType::Int16,
            Self::Int32(_) => HostType::Int32,
            Self::Int64(_) => HostType::Int64,
            Self::UInt8(_) => HostType::UInt8,
            Self::UInt16(_) => HostType::UInt16,
            Self::UInt32(_) => HostType::UInt32,
            Self::UInt64(_) => HostType::UInt64,
            Self::Float32(_) => HostType::Float32,
            Self::Float64(_) => HostType::Float64,
            Self::Decimal(_) => HostType::Decimal,
            Self::DateTime(_) => HostType::DateTime,
            Self::Guid(_) => HostType::Guid,
            Self::Utf8(_) => HostType::Utf8,
            Self::LargeUtf8(_) => HostType::LargeUtf8,
            Self::Binary(_) => HostType::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// The plain textual form of a value (not escaped).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Guid(v) => write!(f, "{}", v.hyphenated()),
            Self::Utf8(s) | Self::LargeUtf8(s) => f.write_str(s),
            Self::Binary(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

value_from!(
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
    Uuid => Guid,
    Vec<u8> => Binary,
);

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Self::Int64(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::UInt64(v as u64)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(HostDateTime::Utc(v))
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::DateTime(HostDateTime::Offset(v))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(HostDateTime::Naive(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One input row: an ordered mapping from field name to [`Value`].
///
/// Field names are unique; inserting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, keeping its original position if it already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Storage type of a list column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Single line of text.
    Text,
    /// Multiple lines of text.
    Note,
    Number,
    DateTime,
    Boolean,
    Currency,
    Guid,
    /// Read-only, server-computed column. Never written.
    Computed,
}

impl ColumnKind {
    /// Whether items may carry a value for a column of this kind.
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Computed)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "Text",
            Self::Note => "Note",
            Self::Number => "Number",
            Self::DateTime => "DateTime",
            Self::Boolean => "Boolean",
            Self::Currency => "Currency",
            Self::Guid => "Guid",
            Self::Computed => "Computed",
        };
        f.write_str(name)
    }
}

/// A single named, typed column of a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Snapshot of a list's columns.
///
/// Names are unique and compared case-sensitively. When built from an iterator, the first
/// descriptor for a name wins. Serializes as a plain array of descriptors, and deserializing
/// applies the same rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ColumnDescriptor>", into = "Vec<ColumnDescriptor>")]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        columns.into_iter().collect()
    }

    /// Add a column. Returns `false` (and leaves the set unchanged) if the name is taken.
    pub fn insert(&mut self, column: ColumnDescriptor) -> bool {
        if self.contains(&column.name) {
            return false;
        }
        self.columns.push(column);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.get(name).map(|c| c.kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Copy of this set without [`ColumnKind::Computed`] columns.
    pub fn writable(&self) -> Self {
        self.columns
            .iter()
            .filter(|c| c.kind.is_writable())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<ColumnDescriptor> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = ColumnDescriptor>>(iter: I) -> Self {
        let mut set = ColumnSet::default();
        for column in iter {
            set.insert(column);
        }
        set
    }
}

impl From<Vec<ColumnDescriptor>> for ColumnSet {
    fn from(columns: Vec<ColumnDescriptor>) -> Self {
        Self::new(columns)
    }
}

impl From<ColumnSet> for Vec<ColumnDescriptor> {
    fn from(set: ColumnSet) -> Self {
        set.columns
    }
}

impl Extend<ColumnDescriptor> for ColumnSet {
    fn extend<I: IntoIterator<Item = ColumnDescriptor>>(&mut self, iter: I) {
        for column in iter {
            self.insert(column);
        }
    }
}

/// A field value serialized for the store's markup-based wire format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireValue(String);

impl WireValue {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write-only projection of one [`Record`] onto list columns, ready to be staged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedItem {
    fields: Vec<(String, WireValue)>,
}

impl StagedItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous value for the same column.
    pub fn set(&mut self, column: impl Into<String>, value: WireValue) {
        let column = column.into();
        match self.fields.iter_mut().find(|(n, _)| *n == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&WireValue> {
        self.fields.iter().find(|(n, _)| n == column).map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Store-assigned item identifier. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of committing one input row.
#[derive(Debug)]
pub struct CommitResult {
    /// 1-based input row number.
    pub row: usize,
    /// Identifier assigned by the store, if the commit succeeded.
    pub item_id: Option<ItemId>,
    pub error: Option<IngestError>,
}

impl CommitResult {
    pub fn success(&self) -> bool {
        self.error.is_none() && self.item_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_insert_replaces_in_place() {
        let mut r = Record::new().with("a", 1i64).with("b", "x");
        r.insert("a", 2i64);
        assert_eq!(r.field_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(r.get("a"), Some(&Value::Int64(2)));
    }

    #[test]
    fn text_is_classified_by_length() {
        assert_eq!(Value::text("short").host_type(), HostType::Utf8);
        let long = "x".repeat(TEXT_MAX_CHARS + 1);
        assert_eq!(Value::text(long).host_type(), HostType::LargeUtf8);
        let edge = "é".repeat(TEXT_MAX_CHARS);
        assert_eq!(Value::text(edge).host_type(), HostType::Utf8);
    }

    #[test]
    fn column_set_is_case_sensitive_and_first_wins() {
        let set = ColumnSet::new(vec![
            ColumnDescriptor::new("Title", ColumnKind::Text),
            ColumnDescriptor::new("title", ColumnKind::Number),
            ColumnDescriptor::new("Title", ColumnKind::Note),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.kind_of("Title"), Some(ColumnKind::Text));
        assert_eq!(set.kind_of("title"), Some(ColumnKind::Number));
        assert_eq!(set.kind_of("TITLE"), None);
    }

    #[test]
    fn writable_drops_computed_columns() {
        let set = ColumnSet::new(vec![
            ColumnDescriptor::new("ID", ColumnKind::Computed),
            ColumnDescriptor::new("Title", ColumnKind::Text),
        ]);
        assert_eq!(set.writable().names().collect::<Vec<_>>(), vec!["Title"]);
    }

    #[test]
    fn option_none_becomes_null() {
        let v: Value = Option::<i32>::None.into();
        assert!(v.is_null());
        assert_eq!(Value::from(Some(3i32)), Value::Int32(3));
    }

    #[test]
    fn binary_displays_as_hex() {
        assert_eq!(Value::Binary(vec![0x0a, 0xff]).to_string(), "0aff");
    }
}
