use list_ingest::schema::{infer, infer_value};
use list_ingest::types::{ColumnKind, HostType, Value};

#[test]
fn type_mapping_table() {
    let cases = [
        (HostType::Float32, ColumnKind::Number),
        (HostType::Float64, ColumnKind::Number),
        (HostType::Int64, ColumnKind::Number),
        (HostType::UInt8, ColumnKind::Number),
        (HostType::Decimal, ColumnKind::Currency),
        (HostType::Bool, ColumnKind::Boolean),
        (HostType::DateTime, ColumnKind::DateTime),
        (HostType::Guid, ColumnKind::Guid),
        (HostType::Utf8, ColumnKind::Text),
        (HostType::LargeUtf8, ColumnKind::Note),
        (HostType::Binary, ColumnKind::Text),
    ];
    for (host, kind) in cases {
        assert_eq!(infer(host), kind, "{host:?}");
    }
}

#[test]
fn inference_depends_on_type_not_value() {
    assert_eq!(infer_value(&Value::Int64(0)), infer_value(&Value::Int64(i64::MAX)));
    assert_eq!(infer_value(&Value::text("")), ColumnKind::Text);
    assert_eq!(infer_value(&Value::Float32(f32::NAN)), ColumnKind::Number);
}
