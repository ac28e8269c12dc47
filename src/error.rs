//! Error types for the call-insight service.
//!
//! This module provides the error taxonomy used by the extraction client, the
//! record store and the request handler. Every error is either a client error
//! (the caller sent unprocessable input) or a server error (something on our
//! side or upstream failed).

use thiserror::Error;

/// Whether an error was caused by the caller or by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unprocessable input; never retried.
    Client,
    /// Upstream, persistence or lifecycle failure.
    Server,
}

/// Errors that can occur while analyzing a call.
#[derive(Error, Debug)]
pub enum InsightError {
    /// Transcript was empty or whitespace only
    #[error("Transcript cannot be empty.")]
    EmptyTranscript,

    /// The record store has not been set up, or was already closed
    #[error("Database pool not initialized.")]
    StoreNotInitialized,

    /// Transport or status failure talking to the LLM provider
    #[error("LLM request failed: {0}")]
    Llm(String),

    /// Provider answered, but not with a JSON object of the expected shape
    #[error("Malformed LLM output: {0}")]
    MalformedOutput(String),

    /// Output parsed, but violates a field constraint
    #[error("Invalid insight: {0}")]
    InvalidInsight(String),

    /// A single LLM attempt ran past its deadline
    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    /// Every extraction attempt failed; carries the last failure
    #[error("LLM generation failed: {source}")]
    ExtractionFailed {
        /// Number of attempts made
        attempts: u32,
        /// Failure of the final attempt
        source: Box<InsightError>,
    },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// `DATABASE_URL` names a backend other than SQLite
    #[error("unsupported database URL scheme: {0}")]
    UnsupportedDatabaseUrl(String),

    /// Filesystem errors while preparing the database location
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking database task panicked or was cancelled
    #[error("Database task failed: {0}")]
    Task(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Result with `InsightError`
pub type Result<T> = std::result::Result<T, InsightError>;

impl InsightError {
    /// Classify the error for status mapping and retry decisions.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyTranscript => ErrorKind::Client,
            _ => ErrorKind::Server,
        }
    }

    /// HTTP status code this error surfaces as.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Client => 422,
            ErrorKind::Server => 500,
        }
    }
}

impl From<tokio::task::JoinError> for InsightError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

impl From<reqwest::Error> for InsightError {
    fn from(err: reqwest::Error) -> Self {
        Self::Llm(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_empty_transcript_is_client_error() {
        assert_eq!(InsightError::EmptyTranscript.kind(), ErrorKind::Client);
        assert_eq!(InsightError::EmptyTranscript.status_code(), 422);
        assert_eq!(InsightError::StoreNotInitialized.status_code(), 500);
        assert_eq!(InsightError::Llm("boom".into()).kind(), ErrorKind::Server);
    }

    #[test]
    fn test_extraction_failed_embeds_last_error() {
        let err = InsightError::ExtractionFailed {
            attempts: 3,
            source: Box::new(InsightError::MalformedOutput("expected value at line 1".into())),
        };
        assert_eq!(
            err.to_string(),
            "LLM generation failed: Malformed LLM output: expected value at line 1"
        );
        assert_eq!(err.status_code(), 500);
    }
}
