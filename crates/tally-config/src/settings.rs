//! Validated settings structures

use crate::schema::{RawConfig, RawServiceConfig, RawSettlementConfig};
use std::path::PathBuf;
use tally_util::socket_path_without_env;

/// Fewest participants a settlement can have
pub const DEFAULT_MIN_PARTICIPANTS: u32 = 2;

/// Currency shown in reports when none is configured
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₽";

/// Validated settings ready for use by the daemon
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub service: ServiceConfig,
    pub settlement: SettlementConfig,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            settlement: SettlementConfig::from_raw(raw.settlement),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            socket_path: raw.socket_path.unwrap_or_else(socket_path_without_env),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: socket_path_without_env(),
        }
    }
}

/// Settlement conversation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementConfig {
    pub min_participants: u32,
    /// None means unbounded
    pub max_participants: Option<u32>,
    pub currency_symbol: String,
}

impl SettlementConfig {
    fn from_raw(raw: RawSettlementConfig) -> Self {
        Self {
            min_participants: raw.min_participants.unwrap_or(DEFAULT_MIN_PARTICIPANTS),
            max_participants: raw.max_participants,
            currency_symbol: raw
                .currency_symbol
                .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()),
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            min_participants: DEFAULT_MIN_PARTICIPANTS,
            max_participants: None,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}
