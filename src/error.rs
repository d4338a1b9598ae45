//! Error types shared across the crate

use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading SQL text from a location
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("file {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("unable to read {}: {}", .path.display(), .source)]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by a [`QueryExecutor`](crate::db::QueryExecutor)
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Setup-time failure of the freshness validator.
///
/// Per-table validation failures are never raised; they are recorded in
/// `TableValidation::validation_error` instead. Only problems that make the
/// whole run impossible (a bad catalog name, an unreachable catalog object,
/// a failed batched query) surface as a `ValidatorError`.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("the provided table catalog name contains invalid characters: {0}")]
    CatalogInvalidCharacters(String),

    #[error(
        "the table catalog name has been provided in a wrong format: {0}. \
         The expected format is TABSCHEMA.TABNAME"
    )]
    CatalogWrongFormat(String),

    #[error("can't connect to the provided table catalog table {catalog}: {source}")]
    CatalogUnreachable {
        catalog: String,
        #[source]
        source: QueryError,
    },

    #[error("error when executing SQL: {source}\n{sql}")]
    Query {
        sql: String,
        #[source]
        source: QueryError,
    },
}

/// Failure while reading the project configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unable to read {}: {}", .path.display(), .source)]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration from {}: {}", .path.display(), .source)]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
