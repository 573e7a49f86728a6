//! switchboard operator CLI.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;
use switchboard::SecurityConfig;
use switchboard::observability::{LogFormat, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format)?;

    #[cfg(feature = "metrics")]
    let meter_provider = switchboard::observability::init_metrics(
        "switchboard",
        std::time::Duration::from_secs(60),
    );

    tracing::debug!(config = ?cli.config, "Loading configuration");
    let config = SecurityConfig::load(cli.config.as_deref())?;

    let code = match cli.command {
        Commands::Token { command } => cli::handle_token_command(config, command).await?,
        Commands::Content { command } => cli::handle_content_command(&config, command)?,
        Commands::Policy { table, column } => cli::handle_policy_command(&table, &column)?,
        Commands::Config { command } => cli::handle_config_command(&config, command)?,
    };

    #[cfg(feature = "metrics")]
    if let Err(e) = meter_provider.shutdown() {
        tracing::warn!(error = %e, "Failed to flush metrics");
    }

    Ok(code)
}
