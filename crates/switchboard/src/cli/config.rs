//! Configuration and policy command handlers.

use super::ConfigCommand;
use std::process::ExitCode;
use switchboard::{PolicyTextGenerator, SecurityConfig};

/// Handles the `config` command.
pub fn handle_config_command(
    config: &SecurityConfig,
    command: ConfigCommand,
) -> anyhow::Result<ExitCode> {
    match command {
        ConfigCommand::Show => {
            print!("{}", config.to_toml_string()?);
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Check => match config.validate() {
            Ok(()) => {
                println!("ok");
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                println!("{}", e.message);
                Ok(ExitCode::FAILURE)
            }
        },
    }
}

/// Handles the `policy` command.
pub fn handle_policy_command(table: &str, column: &str) -> anyhow::Result<ExitCode> {
    print!("{}", PolicyTextGenerator::default().generate(table, column)?);
    Ok(ExitCode::SUCCESS)
}
