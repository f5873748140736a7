//! Error types for the query engine.
//!
//! Only shape errors surface here. Sparse data (missing fields, empty
//! collections, zero denominators) is normalized by the engine itself.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when a query or its configuration does not fit the data.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    /// The configuration references a field the records never expose.
    #[error("unknown field '{field}' referenced by {role}")]
    UnknownField { field: String, role: String },

    /// The query asks for a sort key with no comparator.
    #[error("unknown sort key '{0}'")]
    UnknownSortKey(String),

    /// The query carries a value for a filter the configuration does not declare.
    #[error("filter '{0}' is not declared in the field configuration")]
    UndeclaredFilter(String),

    /// The query value does not fit the declared filter kind.
    #[error("filter '{name}' is a {expected} filter, got a {actual} value")]
    FilterKindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors raised while loading a view configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed YAML.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed JSON.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file extension maps to no known format.
    #[error("unsupported configuration format for {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
