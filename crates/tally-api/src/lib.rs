//! Protocol types for tallyd IPC
//!
//! This crate defines the stable API between tallyd and chat transports:
//! - Commands (requests from transports)
//! - Responses (replies to send back into the chat)
//! - Events (service -> subscribed clients)
//! - Versioning

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
