//! Decoding of JSON-projected rows back into records.

use chrono::NaiveDateTime;
use serde_json::Value as Json;

use crate::domain::{Column, ColumnType, Record, Value};
use crate::error::{Error, Result};

/// Timestamp layouts produced by the supported backends' JSON functions.
const TIMESTAMP_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Decode one projected row. The record lists `columns` in the given order;
/// keys missing from the row decode as `NULL`.
pub fn decode_row(columns: &[&Column], json: &str) -> Result<Record> {
    let mut object: serde_json::Map<String, Json> = serde_json::from_str(json)?;
    let mut record = Record::new();
    for column in columns {
        let raw = object.remove(column.name()).unwrap_or(Json::Null);
        let value = decode_value(column.ty(), raw).map_err(|reason| Error::Decode {
            column: column.name().to_string(),
            reason,
        })?;
        record.insert(column.name(), value);
    }
    Ok(record)
}

fn decode_value(ty: ColumnType, raw: Json) -> std::result::Result<Value, String> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let value = match (ty, &raw) {
        (ColumnType::Integer, Json::Number(n)) => n.as_i64().map(Value::Integer),
        (ColumnType::Float, Json::Number(n)) => n.as_f64().map(Value::Float),
        (ColumnType::Float, Json::String(s)) => s.parse().ok().map(Value::Float),
        (ColumnType::Text, Json::String(s)) => Some(Value::Text(s.clone())),
        (ColumnType::Boolean, Json::Bool(b)) => Some(Value::Boolean(*b)),
        // SQLite and MySQL store booleans as 0/1.
        (ColumnType::Boolean, Json::Number(n)) => n.as_i64().map(|n| Value::Boolean(n != 0)),
        (ColumnType::Timestamp, Json::String(s)) => parse_timestamp(s).map(Value::Timestamp),
        _ => None,
    };
    value.ok_or_else(|| format!("unexpected {ty} value {raw}"))
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("t", "id", ColumnType::Integer),
            Column::new("t", "score", ColumnType::Float),
            Column::new("t", "active", ColumnType::Boolean),
            Column::new("t", "seen_at", ColumnType::Timestamp),
            Column::new("t", "note", ColumnType::Text).nullable(true),
        ]
    }

    #[test]
    fn decodes_in_column_order() {
        let columns = columns();
        let refs: Vec<&Column> = columns.iter().collect();
        let record = decode_row(
            &refs,
            r#"{"note":null,"seen_at":"2024-03-01 12:30:00.5","active":1,"score":2,"id":7}"#,
        )
        .unwrap();
        let names: Vec<_> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["id", "score", "active", "seen_at", "note"]);
        assert_eq!(record.get("score"), Some(&Value::Float(2.0)));
        assert_eq!(record.get("active"), Some(&Value::Boolean(true)));
        assert_eq!(
            record.get("seen_at"),
            Some(&Value::Timestamp(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_milli_opt(12, 30, 0, 500)
                    .unwrap()
            ))
        );
        assert_eq!(record.get("note"), Some(&Value::Null));
    }

    #[test]
    fn floats_decode_from_full_precision_text() {
        let column = Column::new("t", "score", ColumnType::Float);
        let record = decode_row(&[&column], r#"{"score":"0.30000000000000004"}"#).unwrap();
        assert_eq!(record.get("score"), Some(&Value::Float(0.1 + 0.2)));
        let record = decode_row(&[&column], r#"{"score":"2.0"}"#).unwrap();
        assert_eq!(record.get("score"), Some(&Value::Float(2.0)));
        assert!(decode_row(&[&column], r#"{"score":"high"}"#).is_err());
    }

    #[test]
    fn accepts_iso_timestamps() {
        assert!(parse_timestamp("2024-03-01T12:30:00").is_some());
        assert!(parse_timestamp("2024-03-01T12:30:00.123456").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn wrong_shape_names_column() {
        let column = Column::new("t", "id", ColumnType::Integer);
        let err = decode_row(&[&column], r#"{"id":"seven"}"#).unwrap_err();
        assert!(err.to_string().starts_with("cannot decode column `id`"));
    }
}
