//! Provider CLI commands.
//!
//! `chatly provider test` sends a one-turn "Hello" to the configured
//! provider so a bad key or model name shows up before the server starts.

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;

use chatly_infra::config::env_lookup;
use chatly_infra::llm::{create_provider, test_provider_connection};

use crate::state::LoadedConfig;

/// Provider subcommands.
#[derive(Subcommand)]
pub enum ProviderCommand {
    /// Send a test prompt to the configured provider.
    Test,
}

/// Handle a provider subcommand.
pub async fn handle_provider_command(cmd: ProviderCommand, loaded: &LoadedConfig) -> Result<()> {
    match cmd {
        ProviderCommand::Test => test_connection(loaded).await,
    }
}

async fn test_connection(loaded: &LoadedConfig) -> Result<()> {
    let settings = &loaded.config.provider;
    let api_key = env_lookup(&settings.api_key_env).filter(|k| !k.is_empty());

    let provider = create_provider(settings, api_key.as_deref())
        .with_context(|| format!("is {} set?", settings.api_key_env))?;

    print!(
        "  Testing connection to {} ({})... ",
        style(provider.name()).cyan(),
        provider.model()
    );
    let _ = std::io::Write::flush(&mut std::io::stdout());

    match test_provider_connection(&provider).await {
        Ok(response) => {
            println!("{}", style("connected").green().bold());
            println!(
                "  {} {}",
                style("Reply:").dim(),
                response.content.trim()
            );
            println!(
                "  {} {} in / {} out",
                style("Tokens:").dim(),
                response.usage.input_tokens,
                response.usage.output_tokens
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", style("FAILED").red().bold());
            Err(e).context("connection test failed")
        }
    }
}
