//! Core events emitted by the registry

use tally_util::ChatId;

/// Events emitted by the session registry
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
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
}
