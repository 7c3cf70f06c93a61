//! # Error Handling
//!
//! Typed error enums at each seam (database, ADR HTTP, per-stage), mirroring
//! the teacher's categorized `ApiError`/`AppError` split — minus the axum
//! `IntoResponse` glue, which has no counterpart since there is no HTTP
//! surface in this core.

use thiserror::Error;

/// Errors surfaced by the ADR HTTP client (spec §7 error categories).
#[derive(Debug, Error, Clone)]
pub enum AdrError {
    #[error("transient remote error: {status} {body}")]
    Transient { status: u16, body: String },

    #[error("semantic remote error: status id {status_id} ({description})")]
    Semantic {
        status_id: i32,
        description: String,
    },

    #[error("malformed remote response: {truncated_body}")]
    Malformed { truncated_body: String },

    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("network error: {0}")]
    Network(String),
}

impl AdrError {
    /// Truncates a raw response body for storage in `JobExecution.api_response`
    /// (spec §7: 1000 chars for status-check, 500 otherwise).
    pub fn truncate(body: &str, limit: usize) -> String {
        if body.len() <= limit {
            body.to_string()
        } else {
            body.chars().take(limit).collect()
        }
    }
}

/// Fatal errors that abort a stage or run outright (spec §7 "Fatal" row):
/// connection-string missing, DB unreachable, cancellation requested.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("run cancelled")]
    Cancelled,

    #[error("orchestration already running")]
    AlreadyRunning,
}

/// Per-item failures inside a mark/apply loop are never propagated as
/// `OrchestratorError` — they are counted and recorded per spec §7's
/// "Per-item local exception" row. This type documents that contract at
/// the call sites that accumulate them.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub item_id: i64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_bodies_to_limit() {
        let body = "x".repeat(2000);
        let truncated = AdrError::truncate(&body, 500);
        assert_eq!(truncated.len(), 500);
    }

    #[test]
    fn leaves_short_bodies_untouched() {
        let truncated = AdrError::truncate("short", 500);
        assert_eq!(truncated, "short");
    }
}
