//! Event types for tallyd -> client streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tally_util::ChatId;

use crate::API_VERSION;

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: tally_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A chat started (or restarted) a conversation
    SessionStarted { chat_id: ChatId },

    /// A chat's expenses were settled
    SessionSettled {
        chat_id: ChatId,
        participants: usize,
        total: f64,
        average: f64,
        transfer_count: usize,
    },

    /// A chat cancelled its conversation
    SessionCancelled { chat_id: ChatId },

    /// Service is shutting down
    Shutdown,
}
