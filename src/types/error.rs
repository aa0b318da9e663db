//! Error types for nlsql operations.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.
//!
//! The pipeline keeps three failure kinds apart:
//! - `GenerationError`: the completion service call failed
//! - `GuardViolation`: generated SQL is outside the read-only allow-list
//! - `ExecutionError`: the store rejected the statement
//!
//! `Error` covers everything that happens before a request is served
//! (configuration and schema loading).

use std::time::Duration;
use thiserror::Error;

/// Errors raised while setting up the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration is missing or inconsistent
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Schema descriptor failed validation
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl Error {
    /// Create a configuration error with context.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a schema error with context.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaError(msg.into())
    }
}

/// Completion service failure. Fatal to the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Network failure (connect, DNS, reset)
    #[error("LLM transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout
    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    /// Service answered with a non-success status
    #[error("LLM API error {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    /// Service returned no content
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

impl GenerationError {
    /// Check if the failure is worth retrying.
    ///
    /// Transport errors, timeouts, rate limits and 5xx responses are transient.
    /// Malformed or empty bodies and 4xx responses are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::MalformedResponse(_) | Self::EmptyResponse => false,
        }
    }
}

/// Statement execution failure, carried back to the caller as data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Database URL scheme is not supported
    #[error("Unsupported database URL: {0}")]
    UnsupportedUrl(String),

    /// Could not open a connection
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Statement exceeded the configured timeout
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// Engine rejected the statement (syntax, unknown column, type mismatch)
    #[error("{0}")]
    Statement(String),

    /// A result cell could not be converted
    #[error("Failed to decode column '{column}': {detail}")]
    Decode {
        /// Column name
        column: String,
        /// Decoder message
        detail: String,
    },
}

impl From<sqlx::Error> for ExecutionError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => Self::Statement(db_err.message().to_string()),
            sqlx::Error::Io(e) => Self::Connect(e.to_string()),
            sqlx::Error::Tls(e) => Self::Connect(e.to_string()),
            sqlx::Error::PoolTimedOut => Self::Connect("connection timed out".to_string()),
            sqlx::Error::ColumnDecode { index, source } => Self::Decode {
                column: index,
                detail: source.to_string(),
            },
            other => Self::Statement(other.to_string()),
        }
    }
}

/// Generated SQL is outside the read-only allow-list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardViolation {
    /// Nothing to execute
    #[error("Generated SQL is empty")]
    Empty,

    /// Statement does not parse in the configured dialect
    #[error("Generated SQL does not parse: {0}")]
    Parse(String),

    /// More than one statement
    #[error("Expected exactly one statement, found {0}")]
    MultipleStatements(usize),

    /// Statement is not a query (DML, DDL, session commands)
    #[error("Only read-only queries are allowed, got {0}")]
    NotReadOnly(String),

    /// `SELECT ... INTO` writes data
    #[error("SELECT ... INTO is not allowed")]
    SelectInto,

    /// `SELECT ... FOR UPDATE` / `FOR SHARE` takes row locks
    #[error("Locking reads (FOR UPDATE / FOR SHARE) are not allowed")]
    LockingRead,
}
