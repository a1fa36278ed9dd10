//! Config validation CLI tool
//!
//! Validates a tallyd configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use tally_util::default_config_path;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: validate-config [config-file]");
        eprintln!();
        eprintln!("Validates a tallyd configuration file.");
        eprintln!();
        eprintln!("If no path is provided, uses: {}", default_config_path().display());
        return ExitCode::from(2);
    }

    let config_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match tally_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", tally_config::CURRENT_CONFIG_VERSION);
            println!("  Socket: {}", settings.service.socket_path.display());
            println!(
                "  Participants: {} to {}",
                settings.settlement.min_participants,
                settings
                    .settlement
                    .max_participants
                    .map(|max| max.to_string())
                    .unwrap_or_else(|| "unbounded".into())
            );
            println!("  Currency: {}", settings.settlement.currency_symbol);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                tally_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                tally_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                tally_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                tally_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        tally_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
