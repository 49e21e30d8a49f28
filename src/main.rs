//! Application entry point and server initialization
//!
//! Loads configuration, opens the database, builds the link store and starts
//! the HTTP server with graceful shutdown support.

use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tinylink::config::AppConfig;
use tinylink::database::RedbRecords;
use tinylink::handler::AppState;
use tinylink::route::create_app;
use tinylink::store::LinkStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tinylink=debug,tower_http=debug")),
        )
        .init();

    let config = AppConfig::from_env();
    let generator = config.generator()?;
    let records = RedbRecords::open(&config.database_path)?;

    let state = AppState {
        links: Arc::new(LinkStore::new(Arc::new(records), generator)?),
        base_url: config.base_url.clone(),
    };

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    info!(%addr, base_url = %config.base_url, "server running");
    info!(database = %config.database_path, "using database");

    // Runs until SIGTERM or SIGINT; in-flight requests are allowed to finish
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
///
/// A handler that cannot be installed never fires, so the other one still
/// governs shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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

    info!("shutdown signal received, stopping server");
}
