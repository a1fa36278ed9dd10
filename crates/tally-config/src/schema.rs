//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Settlement conversation settings
    #[serde(default)]
    pub settlement: RawSettlementConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path (default: $XDG_RUNTIME_DIR/tally/tallyd.sock)
    pub socket_path: Option<PathBuf>,
}

/// Settlement conversation settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSettlementConfig {
    /// Smallest accepted participant count (default 2, never below 2)
    pub min_participants: Option<u32>,

    /// Largest accepted participant count (default: unbounded)
    pub max_participants: Option<u32>,

    /// Symbol appended to amounts in the report
    pub currency_symbol: Option<String>,
}
