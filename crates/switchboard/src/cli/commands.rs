//! Command-line structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Operator tool for the switchboard security core.
#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(about = "Issue and inspect agent tokens, screen content, and inspect configuration")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML); `SWITCHBOARD__*` variables override it
    #[arg(short, long, global = true, env = "SWITCHBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issue and inspect tokens
    Token {
        #[command(subcommand)]
        command: TokenCommand,
    },
    /// Validate or sanitize message content
    Content {
        #[command(subcommand)]
        command: ContentCommand,
    },
    /// Generate row-level security statements
    Policy {
        /// Table to protect, optionally schema-qualified
        #[arg(long)]
        table: String,
        /// Column holding the owning agent id
        #[arg(long, default_value = "agent_id")]
        column: String,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Token commands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Issue a token and print it
    Issue {
        /// Agent id
        #[arg(long)]
        agent: String,
        /// Machine id
        #[arg(long)]
        machine: String,
        /// Granted capability; repeat for several
        #[arg(long = "capability")]
        capabilities: Vec<String>,
    },
    /// Verify a token and print its claims
    Verify {
        /// Token to verify
        token: String,
    },
    /// Print a token's id without verifying it
    Id {
        /// Token to inspect
        token: String,
    },
}

/// Content commands. Input is read from `--file` or stdin.
#[derive(Subcommand, Debug)]
pub enum ContentCommand {
    /// Validate a message body
    Check {
        /// Read from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// Size cap in bytes; defaults to the configured cap
        #[arg(long)]
        max_bytes: Option<usize>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a JSON metadata object
    Metadata {
        /// Read from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the sanitized input
    Sanitize {
        /// Read from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Configuration commands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML, secret redacted
    Show,
    /// Validate the effective configuration
    Check,
}
