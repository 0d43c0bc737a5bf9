//! Fabula CLI and REST API entry point.
//!
//! Binary name: `fabula`
//!
//! Parses CLI arguments, initializes tracing and application state, then
//! dispatches to the config sync tool or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use fabula_infra::config::resolve_data_dir;
use fabula_infra::storage::LocalDocumentStore;

use cli::{Cli, Commands, SyncDirection};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions write to stdout and need no state or tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "fabula", &mut std::io::stdout());
        return Ok(());
    }

    let enable_otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    fabula_observe::tracing_setup::init_tracing(enable_otel)
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))?;

    match cli.command {
        Commands::Serve { port, host, .. } => {
            let state = AppState::init().await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!("  Fabula API listening on http://{addr}");
            println!("  Press Ctrl+C to stop");

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Sync { direction } => {
            let store = LocalDocumentStore::new(resolve_data_dir());
            match direction {
                SyncDirection::Push { file } => {
                    fabula_infra::sync::push_config(&store, &file).await?;
                    println!("  Pushed {} to the document store", file.display());
                }
                SyncDirection::Pull { file } => {
                    fabula_infra::sync::pull_config(&store, &file).await?;
                    println!("  Pulled {} from the document store", file.display());
                }
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    fabula_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
