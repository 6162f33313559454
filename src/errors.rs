//! Unified application error type.
//! All modules (source, core, db, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // Remote source
    // ---------------------------
    #[error("Authentication rejected by the remote source: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error (HTTP {status}): {message}")]
    Transport { status: u16, message: String },

    // ---------------------------
    // Mapping / validation
    // ---------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    // ---------------------------
    // State machines
    // ---------------------------
    #[error("A timer is already running for task {0}")]
    TimerAlreadyActive(String),

    #[error("No active timer")]
    NoActiveTimer,

    #[error("Edit session error: {0}")]
    EditSession(String),

    // ---------------------------
    // IO / local store
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not connected: run `rtasksync connect` first")]
    NotConnected,
}

impl AppError {
    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        AppError::Transport {
            status,
            message: message.into(),
        }
    }

    /// Generic network/HTTP failures: safe to retry by hand, never retried automatically.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transport { .. })
    }

    /// Credential problems: the user must reconnect.
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, AppError::Auth(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
        AppError::transport(status, e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_is_transient() {
        assert!(AppError::transport(502, "bad gateway").is_transient());
        assert!(!AppError::Auth("bad token".into()).is_transient());
        assert!(!AppError::NotFound("tasks".into()).is_transient());
        assert!(!AppError::Validation("group".into()).is_transient());
    }

    #[test]
    fn auth_requires_reconnect() {
        assert!(AppError::Auth("expired".into()).requires_reconnect());
        assert!(!AppError::transport(0, "offline").requires_reconnect());
    }
}
