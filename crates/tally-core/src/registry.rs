//! Session registry
//!
//! Owns every live chat session and is the only thing a transport talks to:
//! `start`, `deliver_text` and `cancel` map one-to-one onto the transport's
//! triggers and return the messages to send back.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use tally_config::SettlementConfig;
use tally_util::{ChatId, TallyError};
use tracing::{debug, info};

use crate::{Conversation, CoreEvent, Outcome, Rejection, Session, SessionError, Step};

/// What a transport should do after one input
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub chat_id: ChatId,
    /// Messages for the chat, in order
    pub replies: Vec<String>,
    /// Lifecycle change worth broadcasting
    pub event: Option<CoreEvent>,
    /// Set when the input was refused and re-prompted
    pub error: Option<SessionError>,
}

impl Dispatch {
    fn from_step(chat_id: ChatId, step: Step) -> Self {
        let event = step.outcome.map(|outcome| match outcome {
            Outcome::Settled(settlement) => CoreEvent::SessionSettled {
                chat_id: chat_id.clone(),
                participants: settlement.participants,
                total: settlement.total,
                average: settlement.average,
                transfer_count: settlement.transfers.len(),
            },
            Outcome::Cancelled => CoreEvent::SessionCancelled {
                chat_id: chat_id.clone(),
            },
        });

        Self {
            chat_id,
            replies: step.replies,
            event,
            error: None,
        }
    }

    fn from_rejection(chat_id: ChatId, rejection: Rejection) -> Self {
        Self {
            chat_id,
            replies: vec![rejection.reply],
            event: None,
            error: Some(rejection.error),
        }
    }
}

/// All live sessions, keyed by chat
pub struct SessionRegistry {
    conversation: Conversation,
    sessions: HashMap<ChatId, Session>,
}

impl SessionRegistry {
    pub fn new(rules: SettlementConfig) -> Self {
        info!(
            min_participants = rules.min_participants,
            max_participants = ?rules.max_participants,
            currency = %rules.currency_symbol,
            "Session registry initialized"
        );

        Self {
            conversation: Conversation::new(rules),
            sessions: HashMap::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// `start` trigger: (re)create the chat's session and greet
    pub fn start(&mut self, chat_id: &ChatId, now: DateTime<Local>) -> Dispatch {
        let mut session = Session::new(chat_id.clone(), now);
        let step = session.begin(&self.conversation);

        if self.sessions.insert(chat_id.clone(), session).is_some() {
            info!(chat_id = %chat_id, "Session restarted");
        } else {
            info!(chat_id = %chat_id, "Session started");
        }

        let mut dispatch = Dispatch::from_step(chat_id.clone(), step);
        dispatch.event = Some(CoreEvent::SessionStarted {
            chat_id: chat_id.clone(),
        });
        dispatch
    }

    /// Free text from the chat
    pub fn deliver_text(&mut self, chat_id: &ChatId, text: &str) -> Result<Dispatch, TallyError> {
        let session = self
            .sessions
            .get_mut(chat_id)
            .ok_or_else(|| TallyError::NoActiveSession(chat_id.clone()))?;

        let result = session.deliver_text(&self.conversation, text);
        Ok(self.settle_result(chat_id, result))
    }

    /// `cancel` trigger
    pub fn cancel(&mut self, chat_id: &ChatId) -> Result<Dispatch, TallyError> {
        let session = self
            .sessions
            .get_mut(chat_id)
            .ok_or_else(|| TallyError::NoActiveSession(chat_id.clone()))?;

        let result = session.cancel(&self.conversation);
        Ok(self.settle_result(chat_id, result))
    }

    pub fn session(&self, chat_id: &ChatId) -> Option<&Session> {
        self.sessions.get(chat_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Drop every session, returning how many were live
    pub fn clear(&mut self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }

    fn settle_result(
        &mut self,
        chat_id: &ChatId,
        result: Result<Step, Rejection>,
    ) -> Dispatch {
        match result {
            Ok(step) => {
                if step.state.is_terminal() {
                    self.sessions.remove(chat_id);
                    debug!(chat_id = %chat_id, remaining = self.sessions.len(), "Session removed");
                }
                Dispatch::from_step(chat_id.clone(), step)
            }
            Err(rejection) => {
                debug!(chat_id = %chat_id, error = %rejection.error, "Input rejected");
                Dispatch::from_rejection(chat_id.clone(), rejection)
            }
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SettlementConfig::default())
    }
}
