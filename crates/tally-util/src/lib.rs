//! Shared utilities for tallyd
//!
//! This crate provides:
//! - ID types (ChatId, ClientId)
//! - Error types
//! - Default paths for the socket and config file
//! - Wall-clock helper used for event timestamps

mod error;
mod ids;
mod paths;

pub use error::*;
pub use ids::*;
pub use paths::*;

use chrono::{DateTime, Local};

/// Current local wall-clock time
pub fn now() -> DateTime<Local> {
    Local::now()
}
