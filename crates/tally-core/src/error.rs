//! Error types for the settlement conversation

use tally_api::SessionState;
use thiserror::Error;

/// Recoverable conversation errors.
///
/// None of these end the session: the caller re-prompts and the session keeps
/// its state and any previously accepted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("participant count is not a whole number: {text:?}")]
    InvalidNumber { text: String },

    #[error("at least {min} participants required, got {got}")]
    TooFewParticipants { got: i64, min: u32 },

    #[error("at most {max} participants allowed, got {got}")]
    TooManyParticipants { got: i64, max: u32 },

    #[error("expected {expected} participants, parsed {got}")]
    CountMismatch { expected: u32, got: usize },

    #[error("{operation} is not accepted while {state:?}")]
    InvalidState {
        state: SessionState,
        operation: &'static str,
    },

    #[error("session has already terminated")]
    SessionTerminated,

    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

/// Settlement engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("no contributions to settle")]
    EmptyContributions,
}
