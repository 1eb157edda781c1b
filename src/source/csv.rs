//! CSV record source.

use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::types::{Record, Value};

/// Read a CSV file into records.
///
/// Rules:
///
/// - CSV must have headers, and header names must be unique.
/// - Every cell becomes text; blank cells become [`Value::Null`].
/// - Field order follows the header order.
pub fn records_from_path(path: impl AsRef<Path>) -> IngestResult<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    records_from_reader(&mut rdr)
}

/// Read records from an existing CSV reader.
pub fn records_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> IngestResult<Vec<Record>> {
    let headers = rdr.headers()?.clone();
    for (i, h) in headers.iter().enumerate() {
        if headers.iter().take(i).any(|prev| prev == h) {
            return Err(IngestError::InvalidInput {
                message: format!(
                    "duplicate column '{h}'. headers={:?}",
                    headers.iter().collect::<Vec<_>>()
                ),
            });
        }
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, raw)| {
                let value = if raw.trim().is_empty() {
                    Value::Null
                } else {
                    Value::text(raw)
                };
                (name, value)
            })
            .collect();
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> IngestResult<Vec<Record>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(input.as_bytes());
        records_from_reader(&mut rdr)
    }

    #[test]
    fn blank_cells_become_null() {
        let records = read("Title,Notes\nA,\n").unwrap();
        assert_eq!(records[0].get("Title"), Some(&Value::text("A")));
        assert_eq!(records[0].get("Notes"), Some(&Value::Null));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = read("A,A\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate column 'A'"));
    }
}
