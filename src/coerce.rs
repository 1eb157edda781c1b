//! Per-column serialization of field values into [`WireValue`]s.
//!
//! Rules:
//!
//! - [`ColumnKind::DateTime`]: the value is converted to UTC and rendered as
//!   `yyyy-MM-ddTHH:mm:ssZ`. Naive date/times are taken as local time. Text that parses as a
//!   date/time is converted the same way. Instants before year 0 or after year 9999 are clamped
//!   to [`MIN_WIRE_DATETIME`] / [`MAX_WIRE_DATETIME`].
//! - Every other kind: the value's textual form with the five markup-significant characters
//!   (`<`, `>`, `&`, `'`, `"`) escaped.
//!
//! Null values are never coerced; [`crate::mapping`] leaves them out of the item.

use std::borrow::Cow;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::types::{ColumnKind, HostDateTime, Value, WireValue};

/// Wire format for [`ColumnKind::DateTime`] values.
pub const WIRE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Earliest instant the wire format can express.
pub const MIN_WIRE_DATETIME: &str = "0000-01-01T00:00:00Z";

/// Latest instant the wire format can express.
pub const MAX_WIRE_DATETIME: &str = "9999-12-31T23:59:59Z";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Convert one field value to its wire representation for a column of `kind`.
pub fn coerce(value: &Value, kind: ColumnKind) -> WireValue {
    if kind == ColumnKind::DateTime {
        if let Some(utc) = as_utc(value) {
            return WireValue::new(format_utc(&utc));
        }
    }
    WireValue::new(escape_markup(&value.to_string()))
}

/// Render a UTC instant in the wire date/time format (second precision, `Z` suffix).
///
/// The result is always 20 characters; years outside `0..=9999` are clamped.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    match dt.year() {
        year if year < 0 => MIN_WIRE_DATETIME.to_string(),
        year if year > 9999 => MAX_WIRE_DATETIME.to_string(),
        _ => dt.format(WIRE_DATETIME_FORMAT).to_string(),
    }
}

/// Convert a host date/time to UTC. Naive values are interpreted in the local zone.
pub fn to_utc(dt: &HostDateTime) -> DateTime<Utc> {
    match dt {
        HostDateTime::Utc(dt) => *dt,
        HostDateTime::Offset(dt) => dt.with_timezone(&Utc),
        HostDateTime::Naive(naive) => local_to_utc(naive),
    }
}

fn local_to_utc(naive: &NaiveDateTime) -> DateTime<Utc> {
    resolve_naive(naive, |n| {
        Local
            .from_local_datetime(n)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

// Ambiguous local times (DST fall-back) take the earlier instant. A time skipped by a DST gap
// is pushed forward past the gap, so 02:30 in a 02:00-03:00 gap reads as 03:30. Only a time
// with no local instant even then is taken as UTC.
fn resolve_naive<F>(naive: &NaiveDateTime, zone: F) -> DateTime<Utc>
where
    F: Fn(&NaiveDateTime) -> Option<DateTime<Utc>>,
{
    if let Some(utc) = zone(naive) {
        return utc;
    }
    naive
        .checked_add_signed(Duration::hours(1))
        .and_then(|later| zone(&later))
        .unwrap_or_else(|| naive.and_utc())
}

fn as_utc(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::DateTime(dt) => Some(to_utc(dt)),
        Value::Utf8(s) | Value::LargeUtf8(s) => parse_datetime(s.trim()).map(|dt| to_utc(&dt)),
        _ => None,
    }
}

/// Parse a textual date/time: RFC 3339, a handful of naive layouts, or a bare date (midnight).
pub fn parse_datetime(s: &str) -> Option<HostDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(HostDateTime::Offset(dt));
    }
    for layout in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(HostDateTime::Naive(naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(HostDateTime::Naive)
}

/// Escape `<`, `>`, `&`, `'` and `"` as markup entities.
pub fn escape_markup(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '\'', '"']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Inverse of [`escape_markup`]. Unknown entities are left as-is.
pub fn unescape_markup(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = [
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&amp;", '&'),
            ("&apos;", '\''),
            ("&quot;", '"'),
        ]
        .into_iter()
        .find(|(entity, _)| rest.starts_with(entity));
        match decoded {
            Some((entity, c)) => {
                out.push(c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn offset_datetime_is_normalized_to_utc() {
        let dt = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 1, 30, 5)
            .unwrap();
        let wire = coerce(&Value::from(dt), ColumnKind::DateTime);
        assert_eq!(wire.as_str(), "2024-02-29T23:30:05Z");
    }

    #[test]
    fn subsecond_precision_is_truncated() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap() + chrono::Duration::milliseconds(999);
        assert_eq!(coerce(&Value::from(dt), ColumnKind::DateTime).as_str(), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn rfc3339_text_in_datetime_column_is_converted() {
        let wire = coerce(&Value::text("2024-06-30T22:00:00-02:00"), ColumnKind::DateTime);
        assert_eq!(wire.as_str(), "2024-07-01T00:00:00Z");
    }

    #[test]
    fn unparseable_text_in_datetime_column_is_escaped_text() {
        let wire = coerce(&Value::text("soon & later"), ColumnKind::DateTime);
        assert_eq!(wire.as_str(), "soon &amp; later");
    }

    #[test]
    fn datetime_in_text_column_is_not_normalized() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(coerce(&Value::from(dt), ColumnKind::Text).as_str(), "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn out_of_range_years_are_clamped_to_the_wire_range() {
        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(-1, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_utc(&far), MAX_WIRE_DATETIME);
        assert_eq!(format_utc(&before), MIN_WIRE_DATETIME);
        assert_eq!(coerce(&Value::from(far), ColumnKind::DateTime).as_str().len(), 20);

        let year_zero = Utc.with_ymd_and_hms(0, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_utc(&year_zero), "0000-03-04T05:06:07Z");
    }

    // UTC-5 until 2024-03-10 02:00 local, then UTC-4; 02:00-03:00 does not exist.
    fn spring_forward_zone(n: &NaiveDateTime) -> Option<DateTime<Utc>> {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let gap_start = day.and_hms_opt(2, 0, 0).unwrap();
        let gap_end = day.and_hms_opt(3, 0, 0).unwrap();
        if *n < gap_start {
            Some((*n + Duration::hours(5)).and_utc())
        } else if *n < gap_end {
            None
        } else {
            Some((*n + Duration::hours(4)).and_utc())
        }
    }

    #[test]
    fn naive_time_in_dst_gap_moves_past_the_gap() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let in_gap = day.and_hms_opt(2, 30, 0).unwrap();
        let resolved = resolve_naive(&in_gap, spring_forward_zone);
        assert_eq!(format_utc(&resolved), "2024-03-10T07:30:00Z");

        let before_gap = day.and_hms_opt(1, 30, 0).unwrap();
        assert_eq!(format_utc(&resolve_naive(&before_gap, spring_forward_zone)), "2024-03-10T06:30:00Z");
    }

    #[test]
    fn naive_time_with_no_local_instant_falls_back_to_utc() {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(2, 30, 0).unwrap();
        assert_eq!(format_utc(&resolve_naive(&naive, |_| None)), "2024-03-10T02:30:00Z");
    }

    #[test]
    fn escape_covers_all_five_characters() {
        assert_eq!(escape_markup(r#"<a href='x'>"&"</a>"#), "&lt;a href=&apos;x&apos;&gt;&quot;&amp;&quot;&lt;/a&gt;");
        assert!(matches!(escape_markup("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn unescape_inverts_escape_and_keeps_unknown_entities() {
        let raw = r#"Tom & "Jerry" <3 'ok'"#;
        assert_eq!(unescape_markup(&escape_markup(raw)), raw);
        assert_eq!(unescape_markup("&nbsp;&amp;"), "&nbsp;&");
    }

    #[test]
    fn numbers_and_bools_use_their_textual_form() {
        assert_eq!(coerce(&Value::Float64(3.5), ColumnKind::Number).as_str(), "3.5");
        assert_eq!(coerce(&Value::Int32(-7), ColumnKind::Number).as_str(), "-7");
        assert_eq!(coerce(&Value::Bool(true), ColumnKind::Boolean).as_str(), "true");
    }
}
