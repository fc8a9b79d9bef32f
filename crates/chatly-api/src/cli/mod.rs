//! CLI command definitions for the `chatly` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod provider;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use provider::ProviderCommand;

/// Real-time AI chat server.
#[derive(Parser)]
#[command(name = "chatly", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP and WebSocket server.
    Serve {
        /// Port to listen on (overrides config.toml and PORT).
        #[arg(long)]
        port: Option<u16>,

        /// Host address to bind (overrides config.toml and CHATLY_HOST).
        #[arg(long)]
        host: Option<String>,
    },

    /// Completion provider utilities.
    Provider {
        #[command(subcommand)]
        action: ProviderCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
