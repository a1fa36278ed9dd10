//! Error types for tallyd

use thiserror::Error;

use crate::ChatId;

/// Service-level error type shared by the daemon and its clients
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("No active session for chat {0}")]
    NoActiveSession(ChatId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TallyError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}
