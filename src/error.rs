//! Error taxonomy shared by the API client, the cursor stores and the dispatcher.
//!
//! Upstream failures are classified into [`ApiError`] inside the HTTP client, so
//! the reply logic only ever matches on these variants and never on status codes.

use std::path::PathBuf;
use thiserror::Error;

/// A failure reported by (or while talking to) the Twitter/X API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The API answered 429. `reset_at` is the `x-rate-limit-reset` epoch, if sent.
    #[error("rate limited by the X API (reset at {reset_at:?})")]
    RateLimited { reset_at: Option<i64> },
    /// The API answered 403: blocked author, duplicate content, protected account.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Transport failures, other non-success statuses and undecodable bodies.
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Request(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Request(format!("unexpected response body: {}", e))
    }
}

/// A failure to persist the mention cursor.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("failed to write cursor file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cursor database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A string that is not a decimal mention identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid mention id: {0:?}")]
pub struct InvalidMentionId(pub String);
