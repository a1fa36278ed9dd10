//! Session state machine
//!
//! One `Session` per chat. Every operation returns either a `Step` (the state
//! the session is now in plus the replies to send) or a `Rejection` (the
//! error plus a corrective reply). A rejection never changes the session.

use chrono::{DateTime, Local};
use std::num::IntErrorKind;
use tally_api::{SessionState, SessionView};
use tally_config::SettlementConfig;
use tally_util::ChatId;
use tracing::{debug, info};

use crate::{Contributions, Messages, SessionError, Settlement, compute_settlement, parse_expenses};

/// Read-only rules and wording shared by all sessions
#[derive(Debug, Clone)]
pub struct Conversation {
    pub rules: SettlementConfig,
    pub messages: Messages,
}

impl Conversation {
    pub fn new(rules: SettlementConfig) -> Self {
        let messages = Messages::new(rules.currency_symbol.clone());
        Self { rules, messages }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(SettlementConfig::default())
    }
}

/// How a session reached `Terminated`
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Settled(Settlement),
    Cancelled,
}

/// Successful transition
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: SessionState,
    /// Messages for the chat, in order
    pub replies: Vec<String>,
    /// Set only on the transition into `Terminated`
    pub outcome: Option<Outcome>,
}

impl Step {
    fn new(state: SessionState, reply: String) -> Self {
        Self {
            state,
            replies: vec![reply],
            outcome: None,
        }
    }

    fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

/// Refused input: the error and the message asking for it again
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub error: SessionError,
    pub reply: String,
}

impl Rejection {
    fn new(error: SessionError, reply: String) -> Self {
        Self { error, reply }
    }
}

pub type StepResult = Result<Step, Rejection>;

/// A single chat's conversation
#[derive(Debug, Clone)]
pub struct Session {
    chat_id: ChatId,
    state: SessionState,
    expected_participants: Option<u32>,
    contributions: Contributions,
    started_at: DateTime<Local>,
}

impl Session {
    /// Create a session waiting for the participant count.
    ///
    /// Call `begin` to get the greeting.
    pub fn new(chat_id: ChatId, now: DateTime<Local>) -> Self {
        Self {
            chat_id,
            state: SessionState::AwaitingCount,
            expected_participants: None,
            contributions: Contributions::new(),
            started_at: now,
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn expected_participants(&self) -> Option<u32> {
        self.expected_participants
    }

    pub fn contributions(&self) -> &Contributions {
        &self.contributions
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn to_view(&self) -> SessionView {
        SessionView {
            chat_id: self.chat_id.clone(),
            state: self.state,
            expected_participants: self.expected_participants,
            started_at: self.started_at,
        }
    }

    /// Reset all data and ask for the participant count
    pub fn begin(&mut self, conv: &Conversation) -> Step {
        self.state = SessionState::AwaitingCount;
        self.expected_participants = None;
        self.contributions.clear();

        debug!(chat_id = %self.chat_id, "Session begun");

        Step::new(self.state, conv.messages.greeting())
    }

    /// Accept the participant count
    pub fn submit_count(&mut self, conv: &Conversation, text: &str) -> StepResult {
        self.expect_state(conv, SessionState::AwaitingCount, "submit_count")?;

        // Out-of-range integers saturate so they fail the bounds checks below
        let count: i64 = match text.trim().parse::<i64>() {
            Ok(count) => count,
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => i64::MAX,
            Err(e) if *e.kind() == IntErrorKind::NegOverflow => i64::MIN,
            Err(_) => {
                return Err(Rejection::new(
                    SessionError::InvalidNumber {
                        text: text.to_string(),
                    },
                    conv.messages.invalid_number(),
                ));
            }
        };

        let min = conv.rules.min_participants;
        if count < i64::from(min) {
            return Err(Rejection::new(
                SessionError::TooFewParticipants { got: count, min },
                conv.messages.too_few_participants(min),
            ));
        }

        let max = conv.rules.max_participants.unwrap_or(u32::MAX);
        let count = match u32::try_from(count) {
            Ok(count) if count <= max => count,
            _ => {
                return Err(Rejection::new(
                    SessionError::TooManyParticipants { got: count, max },
                    conv.messages.too_many_participants(max),
                ));
            }
        };

        self.expected_participants = Some(count);
        self.contributions.clear();
        self.state = SessionState::AwaitingExpenses;

        debug!(chat_id = %self.chat_id, participants = count, "Participant count accepted");

        Ok(Step::new(self.state, conv.messages.expenses_format()))
    }

    /// Accept the `Name: amount` block and settle
    pub fn submit_expenses(&mut self, conv: &Conversation, text: &str) -> StepResult {
        self.expect_state(conv, SessionState::AwaitingExpenses, "submit_expenses")?;

        let Some(expected) = self.expected_participants else {
            return Err(Rejection::new(
                SessionError::InvalidState {
                    state: self.state,
                    operation: "submit_expenses",
                },
                conv.messages.no_session(),
            ));
        };

        let parsed = parse_expenses(text);
        if parsed.len() != expected as usize {
            debug!(
                chat_id = %self.chat_id,
                expected,
                parsed = parsed.len(),
                "Expense count mismatch"
            );
            return Err(Rejection::new(
                SessionError::CountMismatch {
                    expected,
                    got: parsed.len(),
                },
                conv.messages.count_mismatch(expected),
            ));
        }

        let settlement = compute_settlement(&parsed).map_err(|e| {
            Rejection::new(SessionError::from(e), conv.messages.count_mismatch(expected))
        })?;

        self.contributions = parsed;
        self.state = SessionState::Terminated;

        info!(
            chat_id = %self.chat_id,
            participants = settlement.participants,
            total = settlement.total,
            transfers = settlement.transfers.len(),
            "Session settled"
        );

        let report = conv.messages.report(&settlement);
        Ok(Step::new(self.state, report).with_outcome(Outcome::Settled(settlement)))
    }

    /// Abandon the conversation
    pub fn cancel(&mut self, conv: &Conversation) -> StepResult {
        if self.state.is_terminal() {
            return Err(Rejection::new(
                SessionError::SessionTerminated,
                conv.messages.session_finished(),
            ));
        }

        self.state = SessionState::Terminated;

        info!(chat_id = %self.chat_id, "Session cancelled");

        Ok(Step::new(self.state, conv.messages.cancelled()).with_outcome(Outcome::Cancelled))
    }

    /// Route free text to whatever the current state is waiting for
    pub fn deliver_text(&mut self, conv: &Conversation, text: &str) -> StepResult {
        match self.state {
            SessionState::AwaitingCount => self.submit_count(conv, text),
            SessionState::AwaitingExpenses => self.submit_expenses(conv, text),
            SessionState::Terminated => Err(Rejection::new(
                SessionError::SessionTerminated,
                conv.messages.session_finished(),
            )),
        }
    }

    fn expect_state(
        &self,
        conv: &Conversation,
        expected: SessionState,
        operation: &'static str,
    ) -> Result<(), Rejection> {
        if self.state == expected {
            return Ok(());
        }
        if self.state.is_terminal() {
            return Err(Rejection::new(
                SessionError::SessionTerminated,
                conv.messages.session_finished(),
            ));
        }
        Err(Rejection::new(
            SessionError::InvalidState {
                state: self.state,
                operation,
            },
            conv.messages.no_session(),
        ))
    }
}
