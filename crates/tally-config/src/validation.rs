//! Configuration validation

use crate::schema::{RawConfig, RawServiceConfig, RawSettlementConfig};
use crate::settings::DEFAULT_MIN_PARTICIPANTS;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("min_participants must be at least {min}, got {value}")]
    MinParticipantsTooLow { value: u32, min: u32 },

    #[error("max_participants ({max}) is below min_participants ({min})")]
    MaxBelowMin { min: u32, max: u32 },

    #[error("currency_symbol cannot be empty")]
    EmptyCurrencySymbol,

    #[error("Service config error: {0}")]
    ServiceError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_service(&config.service));
    errors.extend(validate_settlement(&config.settlement));

    errors
}

fn validate_service(service: &RawServiceConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(path) = &service.socket_path {
        if path.as_os_str().is_empty() {
            errors.push(ValidationError::ServiceError(
                "socket_path cannot be empty".into(),
            ));
        } else if path.file_name().is_none() {
            errors.push(ValidationError::ServiceError(format!(
                "socket_path '{}' does not name a file",
                path.display()
            )));
        }
    }

    errors
}

fn validate_settlement(settlement: &RawSettlementConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let min = settlement
        .min_participants
        .unwrap_or(DEFAULT_MIN_PARTICIPANTS);

    if min < DEFAULT_MIN_PARTICIPANTS {
        errors.push(ValidationError::MinParticipantsTooLow {
            value: min,
            min: DEFAULT_MIN_PARTICIPANTS,
        });
    }

    if let Some(max) = settlement.max_participants
        && max < min
    {
        errors.push(ValidationError::MaxBelowMin { min, max });
    }

    if let Some(symbol) = &settlement.currency_symbol
        && symbol.trim().is_empty()
    {
        errors.push(ValidationError::EmptyCurrencySymbol);
    }

    errors
}
