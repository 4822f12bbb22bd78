//! Error types for schema validation, query evaluation and config loading

use serde::Serialize;
use thiserror::Error;

/// Which query engine a query was handed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Css,
    Xpath,
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKind::Css => f.write_str("css"),
            QueryKind::Xpath => f.write_str("xpath"),
        }
    }
}

/// A selector configuration that does not describe a valid rule.
///
/// Every variant carries the dotted path of the offending field
/// (e.g. `comments.text`), or an empty path for the schema root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("`{path}`: expected a mapping of field names to rules")]
    NotAMapping { path: String },

    #[error("`{path}`: rule has no `type` discriminator")]
    MissingKind { path: String },

    #[error("`{path}`: unknown rule type `{kind}` (expected css, xpath or group)")]
    UnknownKind { path: String, kind: String },

    #[error("`{path}`: {kind} rule is missing a non-empty `query`")]
    MissingQuery { path: String, kind: QueryKind },

    #[error("`{path}`: group rule is missing a non-empty `container`")]
    MissingContainer { path: String },

    #[error("`{path}`: group rule is missing non-empty `fields`")]
    MissingFields { path: String },

    #[error("`{path}`: `{key}` must be {expected}")]
    InvalidValue {
        path: String,
        key: String,
        expected: &'static str,
    },
}

impl SchemaError {
    /// Dotted path of the field the error refers to
    pub fn path(&self) -> &str {
        match self {
            SchemaError::NotAMapping { path }
            | SchemaError::MissingKind { path }
            | SchemaError::UnknownKind { path, .. }
            | SchemaError::MissingQuery { path, .. }
            | SchemaError::MissingContainer { path }
            | SchemaError::MissingFields { path }
            | SchemaError::InvalidValue { path, .. } => path,
        }
    }
}

/// A query the underlying CSS or XPath engine refused to compile or run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} query `{query}` rejected: {message}")]
pub struct QueryError {
    pub kind: QueryKind,
    pub query: String,
    pub message: String,
}

impl QueryError {
    pub(crate) fn css(query: &str, message: impl ToString) -> Self {
        Self {
            kind: QueryKind::Css,
            query: query.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn xpath(query: &str, message: impl ToString) -> Self {
        Self {
            kind: QueryKind::Xpath,
            query: query.to_string(),
            message: message.to_string(),
        }
    }
}

/// A rejected query, attributed to the field that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("field `{field}`: {kind} query `{query}` rejected: {message}")]
pub struct ExtractionError {
    /// Dotted field path, e.g. `items.price`
    pub field: String,
    pub kind: QueryKind,
    pub query: String,
    /// Message from the underlying parser
    pub message: String,
}

impl ExtractionError {
    pub(crate) fn from_query(field: String, err: QueryError) -> Self {
        Self {
            field,
            kind: err.kind,
            query: err.query,
            message: err.message,
        }
    }
}

/// Failure to load a scrape configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported config format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("required configuration field missing: {0}")]
    MissingField(&'static str),

    #[error("invalid configuration field `{field}`: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
