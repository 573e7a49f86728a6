//! Token command handler.

use super::TokenCommand;
use std::process::ExitCode;
use switchboard::{SecurityConfig, SecurityFacade, peek_token_id};

/// Handles the `token` command.
///
/// `id` needs no secret; `issue` and `verify` require a valid configuration.
#[tracing::instrument(skip_all)]
pub async fn handle_token_command(
    config: SecurityConfig,
    command: TokenCommand,
) -> anyhow::Result<ExitCode> {
    match command {
        TokenCommand::Id { token } => match peek_token_id(&token) {
            Some(jti) => {
                println!("{}", jti);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                println!("invalid");
                Ok(ExitCode::FAILURE)
            }
        },
        TokenCommand::Issue {
            agent,
            machine,
            capabilities,
        } => {
            let security = SecurityFacade::new(config)?;
            let token = security.create_token(&agent, &machine, capabilities)?;
            tracing::info!(agent = %agent, machine = %machine, "Issued token");
            println!("{}", token);
            security.shutdown().await;
            Ok(ExitCode::SUCCESS)
        }
        TokenCommand::Verify { token } => {
            let security = SecurityFacade::new(config)?;
            let code = match security.check_token(Some(&token)) {
                Ok(claims) => {
                    println!("{}", serde_json::to_string_pretty(&claims)?);
                    ExitCode::SUCCESS
                }
                Err(reason) => {
                    tracing::debug!(%reason, "Token rejected");
                    println!("invalid");
                    ExitCode::FAILURE
                }
            };
            security.shutdown().await;
            Ok(code)
        }
    }
}
