//! Command types for the tallyd protocol

use serde::{Deserialize, Serialize};
use tally_util::{ChatId, ClientId, TallyError};

use crate::{HealthStatus, SessionView, API_VERSION};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }

    /// Convenience for the common "send these messages to the chat" reply
    pub fn replies(request_id: u64, chat_id: ChatId, messages: Vec<String>) -> Self {
        Self::success(request_id, ResponsePayload::Replies { chat_id, messages })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&TallyError> for ErrorInfo {
    fn from(err: &TallyError) -> Self {
        let code = match err {
            TallyError::NoActiveSession(_) => ErrorCode::NoActiveSession,
            TallyError::InvalidRequest(_) => ErrorCode::InvalidRequest,
        };
        Self::new(code, err.to_string())
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    UnsupportedVersion,
    NoActiveSession,
}

/// All possible commands from transports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// `start` trigger: begin (or restart) the conversation in a chat
    Start { chat_id: ChatId },

    /// `cancel` trigger: abandon the conversation in a chat
    Cancel { chat_id: ChatId },

    /// Free-form user text for a chat
    Deliver { chat_id: ChatId, text: String },

    /// Inspect a chat's session
    GetSession { chat_id: ChatId },

    /// Get health status
    GetHealth,

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// Messages to send back into the chat, in order
    Replies {
        chat_id: ChatId,
        messages: Vec<String>,
    },
    /// `None` when the chat has no session
    Session(Option<SessionView>),
    Health(HealthStatus),
    Subscribed {
        client_id: ClientId,
    },
    Pong,
}
