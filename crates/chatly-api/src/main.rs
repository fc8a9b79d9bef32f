//! Chatly server and CLI entry point.
//!
//! Binary name: `chatly`
//!
//! Parses CLI arguments, sets up tracing, then either runs a utility command
//! or starts the HTTP/WebSocket server.

mod cli;
mod http;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use chatly_core::repository::blacklist::TokenBlacklist;

use cli::{Cli, Commands};
use state::{AppState, ConcreteAuthService};

/// How often expired blacklist entries are deleted.
const BLACKLIST_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,chatly=debug",
        _ => "trace",
    };
    chatly_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "chatly", &mut std::io::stdout());
        return Ok(());
    }

    let mut loaded = state::load_config().await?;

    let result = match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                loaded.config.port = port;
            }
            if let Some(host) = host {
                loaded.config.host = host;
            }
            serve(loaded).await
        }
        Commands::Provider { action } => {
            cli::provider::handle_provider_command(action, &loaded).await
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    chatly_observe::tracing_setup::shutdown_tracing();
    result
}

async fn serve(loaded: state::LoadedConfig) -> anyhow::Result<()> {
    let state = AppState::init(loaded).await?;
    let db_pool = state.db_pool.clone();

    let shutdown = CancellationToken::new();
    let purge = tokio::spawn(purge_blacklist(
        state.auth_service.clone(),
        shutdown.clone(),
    ));

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!();
    println!(
        "  {} Chatly listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {} {}",
        console::style("Data:").dim(),
        state.data_dir.display()
    );
    println!(
        "  {} {}",
        console::style("CORS origin:").dim(),
        state.config.cors_origin
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Err(e) = purge.await {
        tracing::warn!("Blacklist purge task ended abnormally: {e}");
    }
    db_pool.writer.close().await;
    db_pool.reader.close().await;

    println!("\n  Server stopped.");
    Ok(())
}

/// Periodically delete blacklist entries whose tokens have expired anyway.
async fn purge_blacklist(auth_service: Arc<ConcreteAuthService>, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(BLACKLIST_PURGE_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                match auth_service.blacklist().purge_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "Purged expired blacklist entries"),
                    Err(e) => tracing::warn!("Blacklist purge failed: {e}"),
                }
            }
        }
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
