//! Content command handler.

use super::ContentCommand;
use anyhow::Context;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use switchboard::{ContentValidator, SecurityConfig, ValidationResult};

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn report(result: &ValidationResult, json: bool) -> anyhow::Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.is_valid() {
        println!("valid");
    } else {
        for error in result.errors() {
            println!("{}", error);
        }
    }
    Ok(if result.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Handles the `content` command.
#[tracing::instrument(skip_all)]
pub fn handle_content_command(
    config: &SecurityConfig,
    command: ContentCommand,
) -> anyhow::Result<ExitCode> {
    let validator = ContentValidator::new(config.content().clone());
    match command {
        ContentCommand::Check {
            file,
            max_bytes,
            json,
        } => {
            let text = read_input(file.as_deref())?;
            let max_bytes = max_bytes.unwrap_or(*config.content().max_message_size_bytes());
            report(&validator.validate_content(&text, max_bytes), json)
        }
        ContentCommand::Metadata { file } => {
            let text = read_input(file.as_deref())?;
            let metadata: serde_json::Value =
                serde_json::from_str(&text).context("Metadata is not valid JSON")?;
            report(&validator.validate_metadata(&metadata), false)
        }
        ContentCommand::Sanitize { file } => {
            let text = read_input(file.as_deref())?;
            print!("{}", validator.sanitize_content(&text));
            Ok(ExitCode::SUCCESS)
        }
    }
}
