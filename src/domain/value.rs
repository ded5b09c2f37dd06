//! Column types and the values stored in them.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format used to render timestamps in text output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// SQL type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit signed integer.
    Integer,
    /// Double precision float.
    Float,
    /// Unbounded text.
    Text,
    /// Boolean flag.
    Boolean,
    /// Naive UTC date-time.
    Timestamp,
}

impl ColumnType {
    /// Name of the Rust type values of this column decode into.
    #[must_use]
    pub const fn rust_type_name(self) -> &'static str {
        match self {
            Self::Integer => "i64",
            Self::Float => "f64",
            Self::Text => "String",
            Self::Boolean => "bool",
            Self::Timestamp => "NaiveDateTime",
        }
    }

    /// Whether a non-null value may be stored in a column of this type.
    ///
    /// Integers are accepted by float columns.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Integer, Value::Integer(_))
                | (Self::Float, Value::Float(_) | Value::Integer(_))
                | (Self::Text, Value::Text(_))
                | (Self::Boolean, Value::Boolean(_))
                | (Self::Timestamp, Value::Timestamp(_))
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Short lowercase name of the value's kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Boolean(_) => "boolean",
            Self::Timestamp(_) => "timestamp",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{}", v.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A value did not have the shape a Rust field expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got {found} value")]
pub struct ValueError {
    pub expected: &'static str,
    pub found: &'static str,
}

/// Rust types that can be stored in a mapped column.
///
/// The implementing type decides the column's SQL type and nullability.
pub trait SqlValue: Sized {
    const TYPE: ColumnType;
    const NULLABLE: bool = false;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Result<Self, ValueError>;
}

fn mismatch<T>(expected: &'static str, value: &Value) -> Result<T, ValueError> {
    Err(ValueError {
        expected,
        found: value.kind(),
    })
}

impl SqlValue for i64 {
    const TYPE: ColumnType = ColumnType::Integer;

    fn into_value(self) -> Value {
        Value::Integer(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Integer(v) => Ok(v),
            other => mismatch("i64", &other),
        }
    }
}

impl SqlValue for i32 {
    const TYPE: ColumnType = ColumnType::Integer;

    fn into_value(self) -> Value {
        Value::Integer(i64::from(self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Integer(v) => i32::try_from(v).map_err(|_| ValueError {
                expected: "i32",
                found: "out of range integer",
            }),
            other => mismatch("i32", &other),
        }
    }
}

impl SqlValue for f64 {
    const TYPE: ColumnType = ColumnType::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Integer(v) => Ok(v as f64),
            other => mismatch("f64", &other),
        }
    }
}

impl SqlValue for String {
    const TYPE: ColumnType = ColumnType::Text;

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(v) => Ok(v),
            other => mismatch("String", &other),
        }
    }
}

impl SqlValue for bool {
    const TYPE: ColumnType = ColumnType::Boolean;

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Boolean(v) => Ok(v),
            other => mismatch("bool", &other),
        }
    }
}

impl SqlValue for NaiveDateTime {
    const TYPE: ColumnType = ColumnType::Timestamp;

    fn into_value(self) -> Value {
        Value::Timestamp(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => mismatch("NaiveDateTime", &other),
        }
    }
}

impl<T: SqlValue> SqlValue for Option<T> {
    const TYPE: ColumnType = T::TYPE;
    const NULLABLE: bool = true;

    fn into_value(self) -> Value {
        self.map_or(Value::Null, SqlValue::into_value)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
