//! Per-backend SQL syntax.

use std::fmt;

use crate::domain::ColumnType;
use crate::error::ValidationError;

/// Most `key, value` pairs passed to one JSON object function. Bundled SQLite
/// caps function arguments at 127 and PostgreSQL at 100.
pub const JSON_OBJECT_MAX_PAIRS: usize = 50;

/// SQL flavour of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `?` placeholders, `"` quoting.
    Sqlite,
    /// `$n` placeholders, `"` quoting.
    Postgres,
    /// `?` placeholders, backtick quoting.
    MySql,
}

impl Dialect {
    /// Placeholder for the bind at 1-based `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Postgres => format!("${index}"),
            Self::Sqlite | Self::MySql => "?".to_string(),
        }
    }

    const fn quote_char(self) -> char {
        match self {
            Self::MySql => '`',
            Self::Sqlite | Self::Postgres => '"',
        }
    }

    /// Validate and quote an identifier.
    pub fn quote(self, kind: &'static str, ident: &str) -> Result<String, ValidationError> {
        validate_identifier(kind, ident)?;
        let q = self.quote_char();
        Ok(format!("{q}{ident}{q}"))
    }

    /// DDL type name for a column type.
    pub const fn column_type(self, ty: ColumnType) -> &'static str {
        match (self, ty) {
            (Self::Sqlite, ColumnType::Integer) => "INTEGER",
            (Self::Postgres | Self::MySql, ColumnType::Integer) => "BIGINT",
            (Self::Sqlite, ColumnType::Float) => "REAL",
            (Self::Postgres, ColumnType::Float) => "DOUBLE PRECISION",
            (Self::MySql, ColumnType::Float) => "DOUBLE",
            (_, ColumnType::Text) => "TEXT",
            (_, ColumnType::Boolean) => "BOOLEAN",
            (Self::Sqlite | Self::Postgres, ColumnType::Timestamp) => "TIMESTAMP",
            (Self::MySql, ColumnType::Timestamp) => "DATETIME(6)",
        }
    }

    /// Type and constraint text of a single autoincrement primary key column.
    pub const fn autoincrement_primary_key(self) -> &'static str {
        match self {
            Self::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Self::Postgres => "BIGSERIAL PRIMARY KEY",
            Self::MySql => "BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY",
        }
    }

    /// Expression projecting a column into a JSON row.
    ///
    /// SQLite renders REAL values inside JSON with 15 significant digits, so
    /// floats travel as 17-digit text there.
    pub fn json_value(self, ty: ColumnType, quoted: &str) -> String {
        match (self, ty) {
            (Self::Sqlite, ColumnType::Float) => {
                format!("CASE WHEN {quoted} IS NULL THEN NULL ELSE printf('%!.17g', {quoted}) END")
            }
            _ => quoted.to_string(),
        }
    }

    /// Wrap groups of `key, value` pairs into an expression yielding one JSON
    /// text value. Each group holds at most [`JSON_OBJECT_MAX_PAIRS`] pairs;
    /// several groups are merged into a single object.
    pub fn json_object(self, groups: &[String]) -> String {
        match (self, groups) {
            (Self::Sqlite, [first, rest @ ..]) => {
                rest.iter().fold(format!("json_object({first})"), |merged, pairs| {
                    format!("json_patch({merged}, json_object({pairs}))")
                })
            }
            (Self::Postgres, [single]) => format!("json_build_object({single})::text"),
            (Self::Postgres, _) => {
                let objects: Vec<String> = groups
                    .iter()
                    .map(|pairs| format!("jsonb_build_object({pairs})"))
                    .collect();
                format!("({})::text", objects.join(" || "))
            }
            (Self::MySql, [single]) => format!("CAST(JSON_OBJECT({single}) AS CHAR)"),
            (Self::MySql, _) => {
                let objects: Vec<String> = groups
                    .iter()
                    .map(|pairs| format!("JSON_OBJECT({pairs})"))
                    .collect();
                format!("CAST(JSON_MERGE_PATCH({}) AS CHAR)", objects.join(", "))
            }
            (Self::Sqlite, []) => "json_object()".to_string(),
        }
    }

    /// Insert statement tail for a row where every column takes its default.
    pub const fn default_values(self) -> &'static str {
        match self {
            Self::Sqlite | Self::Postgres => "DEFAULT VALUES",
            Self::MySql => "() VALUES ()",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
        };
        f.write_str(name)
    }
}

/// Identifiers must match `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(kind: &'static str, ident: &str) -> Result<(), ValidationError> {
    let mut chars = ident.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier {
            kind,
            ident: ident.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_follow_backend() {
        assert_eq!(Dialect::Sqlite.placeholder(3), "?");
        assert_eq!(Dialect::MySql.placeholder(3), "?");
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
    }

    #[test]
    fn quoting_follows_backend() {
        assert_eq!(Dialect::Sqlite.quote("table", "users").unwrap(), "\"users\"");
        assert_eq!(Dialect::MySql.quote("table", "users").unwrap(), "`users`");
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        for ident in ["", "1users", "users; DROP", "a-b", "naïve", "\"x\""] {
            assert!(
                validate_identifier("column", ident).is_err(),
                "{ident:?} should be rejected"
            );
        }
        assert!(validate_identifier("column", "_created_at2").is_ok());
    }

    #[test]
    fn float_type_names() {
        assert_eq!(Dialect::Sqlite.column_type(ColumnType::Float), "REAL");
        assert_eq!(
            Dialect::Postgres.column_type(ColumnType::Float),
            "DOUBLE PRECISION"
        );
        assert_eq!(Dialect::MySql.column_type(ColumnType::Timestamp), "DATETIME(6)");
    }

    #[test]
    fn json_projection_is_text() {
        let single = ["'a', \"a\"".to_string()];
        assert_eq!(
            Dialect::Postgres.json_object(&single),
            "json_build_object('a', \"a\")::text"
        );
        assert_eq!(Dialect::Sqlite.json_object(&single), "json_object('a', \"a\")");
    }

    #[test]
    fn wide_projections_merge_groups() {
        let groups = ["'a', \"a\"".to_string(), "'b', \"b\"".to_string(), "'c', \"c\"".to_string()];
        assert_eq!(
            Dialect::Sqlite.json_object(&groups),
            "json_patch(json_patch(json_object('a', \"a\"), json_object('b', \"b\")), json_object('c', \"c\"))"
        );
        assert_eq!(
            Dialect::Postgres.json_object(&groups[..2]),
            "(jsonb_build_object('a', \"a\") || jsonb_build_object('b', \"b\"))::text"
        );
        assert_eq!(
            Dialect::MySql.json_object(&groups[..2]),
            "CAST(JSON_MERGE_PATCH(JSON_OBJECT('a', \"a\"), JSON_OBJECT('b', \"b\")) AS CHAR)"
        );
    }

    #[test]
    fn sqlite_floats_project_as_full_precision_text() {
        assert_eq!(
            Dialect::Sqlite.json_value(ColumnType::Float, "\"score\""),
            "CASE WHEN \"score\" IS NULL THEN NULL ELSE printf('%!.17g', \"score\") END"
        );
        assert_eq!(Dialect::Sqlite.json_value(ColumnType::Integer, "\"id\""), "\"id\"");
        assert_eq!(Dialect::Postgres.json_value(ColumnType::Float, "\"score\""), "\"score\"");
    }
}
