//! Error types for cite-chat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use crate::assistant::RunStatus;
use thiserror::Error;

/// Main error type for cite-chat operations
///
/// Covers configuration problems (fatal at startup), failures reported by
/// the hosted assistant service, and the outcomes of waiting on a run.
#[derive(Error, Debug)]
pub enum CiteChatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing API credential
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The assistant service rejected or failed a request
    #[error("Assistant service error during {operation} (status {status}): {message}")]
    Service {
        /// Remote operation that failed (e.g. `create_run`)
        operation: String,
        /// HTTP status code returned by the service
        status: u16,
        /// Error message reported by the service
        message: String,
    },

    /// A run left the pending state without completing
    #[error("Run {run_id} finished with status {status}: {message}")]
    RunNotCompleted {
        /// Identifier of the run
        run_id: String,
        /// Terminal status reported by the service
        status: RunStatus,
        /// Service-provided reason, if any
        message: String,
    },

    /// The run did not finish within the configured time budget
    #[error("Timed out after {elapsed_secs}s waiting for run {run_id}")]
    PollTimeout {
        /// Identifier of the run
        run_id: String,
        /// Seconds spent waiting
        elapsed_secs: u64,
    },

    /// The run did not finish within the configured number of status checks
    #[error("Run {run_id} still pending after {attempts} status checks")]
    PollAttemptsExceeded {
        /// Identifier of the run
        run_id: String,
        /// Number of retrievals issued
        attempts: u32,
    },

    /// The wait was cancelled by the user
    #[error("Cancelled while waiting for run {run_id}")]
    Cancelled {
        /// Identifier of the run
        run_id: String,
    },

    /// Input rejected before any remote call was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CiteChatError {
    /// Build a `Service` error for the given operation
    pub fn service(operation: &str, status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            operation: operation.to_string(),
            status,
            message: message.into(),
        }
    }
}

/// Result type alias for cite-chat operations
///
/// Uses `anyhow::Error` so callers can attach context; typed variants are
/// recovered with `downcast_ref::<CiteChatError>()`.
pub type Result<T> = anyhow::Result<T>;
