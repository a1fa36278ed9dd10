//! Settlement engine and conversation state machine for tallyd
//!
//! This crate is the heart of tallyd, containing:
//! - Expense line parsing (`Name: amount`)
//! - The settlement engine (who pays whom so everyone paid the average)
//! - The per-chat session state machine (AwaitingCount -> AwaitingExpenses -> Terminated)
//! - Message rendering for prompts, corrections and the final report
//! - A registry routing transport input to the right chat's session

mod contribution;
mod error;
mod events;
mod messages;
mod parse;
mod registry;
mod session;
mod settlement;

#[cfg(test)]
mod proptests;

pub use contribution::*;
pub use error::*;
pub use events::*;
pub use messages::*;
pub use parse::*;
pub use registry::*;
pub use session::*;
pub use settlement::*;
