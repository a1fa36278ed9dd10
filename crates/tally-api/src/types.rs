//! Shared types for the tallyd API

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tally_util::ChatId;

/// Conversation state of a single chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the number of participants
    AwaitingCount,
    /// Waiting for the `Name: amount` lines
    AwaitingExpenses,
    /// Settled or cancelled; accepts no further input
    Terminated,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// Snapshot of a chat session for clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub chat_id: ChatId,
    pub state: SessionState,
    /// Set once the participant count has been accepted
    pub expected_participants: Option<u32>,
    pub started_at: DateTime<Local>,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub active_sessions: usize,
}
