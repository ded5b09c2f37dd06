use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Rejections raised before anything reaches the database.
///
/// The assertion variants describe malformed models, columns and
/// conditions; [`ValidationError::Type`] reports values that do not fit the
/// column they target.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("The models passed (position, name) [{}] are not mapped in the database.", .models.join(", "))]
    UnmappedModels { models: Vec<String> },

    #[error("{title}The following columns {{{}}} do not belong to the model {model}.", .columns.join(", "))]
    ForeignColumns {
        title: String,
        model: String,
        columns: Vec<String>,
    },

    #[error("The following primary key columns {{{}}} should not have values{context}.", .columns.join(", "))]
    PrimaryKeyAssigned { columns: Vec<String>, context: String },

    #[error("{title}{}", .problems.join(" | "))]
    Type { title: String, problems: Vec<String> },

    #[error("{what} should not be empty.")]
    Empty { what: &'static str },

    #[error("Limit should be a positive integer.")]
    InvalidLimit,

    #[error("table `{name}` is already registered with a different definition")]
    ConflictingTable { name: String },

    #[error("invalid {kind} identifier: {ident}")]
    InvalidIdentifier { kind: &'static str, ident: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("cannot decode column `{column}`: {reason}")]
    Decode { column: String, reason: String },

    #[error("{backend} support is not compiled in (enable the `{feature}` feature)")]
    UnsupportedBackend {
        backend: &'static str,
        feature: &'static str,
    },

    #[error("{operation} only supported for SQLite databases")]
    SqliteOnly { operation: &'static str },

    #[error("{operation} requires a file-backed SQLite database")]
    InMemory { operation: &'static str },

    #[error("{operation} source and destination are the same file: {}", .path.display())]
    SameFile {
        operation: &'static str,
        path: std::path::PathBuf,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        // dialoguer::Error wraps an IO error
        Error::Io(std::io::Error::other(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_models_lists_positions() {
        let err = ValidationError::UnmappedModels {
            models: vec!["0 - (users)".into(), "2 - (posts)".into()],
        };
        assert_eq!(
            err.to_string(),
            "The models passed (position, name) [0 - (users), 2 - (posts)] are not mapped in the database."
        );
    }

    #[test]
    fn foreign_columns_keeps_title_prefix() {
        let err = ValidationError::ForeignColumns {
            title: "Checking filter: ".into(),
            model: "users".into(),
            columns: vec!["posts.title".into()],
        };
        assert_eq!(
            err.to_string(),
            "Checking filter: The following columns {posts.title} do not belong to the model users."
        );
    }

    #[test]
    fn type_error_joins_problems() {
        let err = ValidationError::Type {
            title: String::new(),
            problems: vec!["first".into(), "second".into()],
        };
        assert_eq!(err.to_string(), "first | second");
    }

    #[test]
    fn sqlite_only_names_operation() {
        let err = Error::SqliteOnly {
            operation: "Backup",
        };
        assert_eq!(err.to_string(), "Backup only supported for SQLite databases");
    }

    #[test]
    fn same_file_names_operation_and_path() {
        let err = Error::SameFile {
            operation: "Restore",
            path: std::path::PathBuf::from("/data/app.db"),
        };
        assert_eq!(
            err.to_string(),
            "Restore source and destination are the same file: /data/app.db"
        );
    }

    #[test]
    fn config_errors_name_the_field() {
        let err = ConfigError::InvalidValue {
            field: "database.pool_size",
            reason: "must be greater than 0".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for database.pool_size: must be greater than 0"
        );
    }
}
