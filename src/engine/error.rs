// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the AggregateHub engine
//!
//! Driver-specific errors are mapped to these unified error types so the
//! orchestrator can classify per-target failures consistently.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::types::ErrorClass;

/// Unified error type for all engine operations
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Query error: {message}")]
    QueryError { message: String },

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Target not found: {name}")]
    NotFound { name: String },

    #[error("Merge error: {message}")]
    Merge { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration { message: msg.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError { message: msg.into() }
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: msg.into() }
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: msg.into() }
    }

    pub fn query_error(msg: impl Into<String>) -> Self {
        Self::QueryError { message: msg.into() }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }

    /// Maps an error raised inside one target's task to the classification
    /// recorded in that target's outcome.
    ///
    /// A cancelled task is only ever cancelled by the fan-out deadline, so it
    /// is reported as a timeout.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::ConnectionFailed { .. } | Self::AuthenticationFailed { .. } => {
                ErrorClass::Connection
            }
            Self::QueryError { .. } => ErrorClass::Query,
            Self::Timeout { .. } | Self::Cancelled => ErrorClass::Timeout,
            Self::Merge { .. } => ErrorClass::Merge,
            Self::Configuration { .. }
            | Self::ValidationError { .. }
            | Self::NotFound { .. }
            | Self::Internal { .. } => ErrorClass::Internal,
        }
    }

    /// Maps a SQLx error to the engine taxonomy.
    ///
    /// Anything that happened before a statement reached the server is a
    /// connection problem; errors reported by the database itself, and
    /// row decoding failures, are query problems.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.to_string();
                let lower = message.to_ascii_lowercase();
                if lower.contains("access denied") || lower.contains("password authentication") {
                    Self::auth_failed(message)
                } else {
                    Self::query_error(message)
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Protocol(_)
            | sqlx::Error::Configuration(_) => Self::connection_failed(err.to_string()),
            other => Self::query_error(other.to_string()),
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            EngineError::connection_failed("refused").classify(),
            ErrorClass::Connection
        );
        assert_eq!(
            EngineError::auth_failed("denied").classify(),
            ErrorClass::Connection
        );
        assert_eq!(EngineError::query_error("bad").classify(), ErrorClass::Query);
        assert_eq!(
            EngineError::Timeout { timeout_ms: 10 }.classify(),
            ErrorClass::Timeout
        );
        assert_eq!(EngineError::Cancelled.classify(), ErrorClass::Timeout);
        assert_eq!(EngineError::internal("boom").classify(), ErrorClass::Internal);
    }

    #[test]
    fn test_sqlx_pool_errors_are_connection_failures() {
        let err = EngineError::from_sqlx(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, EngineError::ConnectionFailed { .. }));

        let err = EngineError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(err, EngineError::QueryError { .. }));
    }

    #[test]
    fn test_display() {
        let err = EngineError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Operation timed out after 5000ms");
        assert_eq!(
            EngineError::validation("id must not be empty").to_string(),
            "Validation error: id must not be empty"
        );
    }
}
