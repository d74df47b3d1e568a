//! decknotes-server - REST API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use decknotes_core::NotesConfig;
use decknotes_server::{create_server, create_state, ServerSettings};
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("decknotes_server=debug".parse()?),
        )
        .init();

    let config = NotesConfig::load().context("failed to load decknotes configuration")?;
    let settings = ServerSettings::from_env().context("invalid server settings")?;

    if settings.require_auth {
        info!("Authentication enabled");
    } else {
        info!("Authentication disabled");
    }

    let addr: SocketAddr = settings
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", settings.bind_address()))?;

    let state = create_state(config, settings);
    let app = create_server(state);

    info!("Starting decknotes-server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
