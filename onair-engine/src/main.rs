//! On-Air Sync Engine (onair-engine) - Main entry point
//!
//! Runs the sync engine against a document store and exposes the HTTP
//! control surface. The bundled in-memory store backs local runs; a
//! production deployment substitutes the shared remote store behind the
//! same trait.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onair_common::config::{default_config_file, resolve_setting};
use onair_engine::config::Config;
use onair_engine::state::SharedState;
use onair_engine::store::MemoryDocumentStore;
use onair_engine::sync::SyncEngine;

/// Command-line arguments for onair-engine
///
/// Each setting resolves CLI > environment > config file > compiled
/// default via [`resolve_setting`].
#[derive(Parser, Debug)]
#[command(name = "onair-engine")]
#[command(about = "On-air graphics sync engine")]
#[command(version)]
struct Args {
    /// Address to bind the HTTP control surface to
    #[arg(short, long)]
    bind_addr: Option<String>,

    /// Path of the on-air document in the remote store
    #[arg(short, long)]
    document_path: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "ONAIR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onair_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Explicit --config wins; otherwise the platform default location
    let config_file = args.config.clone().or_else(|| default_config_file().ok());
    let mut config = match &config_file {
        Some(path) => Config::load(path).context("Failed to load configuration")?,
        None => Config::default(),
    };

    let defaults = Config::default();
    config.bind_addr = resolve_setting(
        args.bind_addr.as_deref(),
        "ONAIR_BIND_ADDR",
        config_file.as_deref(),
        "bind_addr",
        &defaults.bind_addr,
    );
    config.document_path = resolve_setting(
        args.document_path.as_deref(),
        "ONAIR_DOCUMENT_PATH",
        config_file.as_deref(),
        "document_path",
        &defaults.document_path,
    );

    info!("Starting on-air sync engine on {}", config.bind_addr);
    info!("Document path: {}", config.document_path);

    let store = Arc::new(MemoryDocumentStore::new());
    let shared = Arc::new(SharedState::new());

    let engine = SyncEngine::start(store, config.clone(), shared.clone())
        .await
        .context("Failed to start sync engine")?;
    info!("Sync engine initialized");

    tokio::select! {
        result = onair_engine::api::run(&config, shared, engine) => {
            result.context("Server error")?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
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
