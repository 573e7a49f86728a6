//! Command-line interface for the switchboard binary.

mod commands;
mod config;
mod content;
mod token;

pub use commands::{Cli, Commands, ConfigCommand, ContentCommand, TokenCommand};
pub use config::{handle_config_command, handle_policy_command};
pub use content::handle_content_command;
pub use token::handle_token_command;
