//! Movies Indexer Main Entry Point
//!
//! This is the main binary for the movies indexer. It keeps the movies
//! search index in sync with the PostgreSQL content database.

use dotenv::dotenv;
use movies_indexer::{Dependencies, IndexingError, Settings};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("movies_indexer=info,movies_indexer_repository=info")
    });

    let json_logs = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        // Structured logging for log shippers
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "movies-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "movies-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting movies indexer");

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e);
        }
    };

    let mut deps = match Dependencies::new(settings).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.orchestrator.run().await {
        Ok(()) => {
            info!("Movies indexer stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Movies indexer failed");
            Err(e.into())
        }
    }
}
