//! trafficnet-labeler - Web labeling tool for TrafficNet camera images
//!
//! Serves one labeling page per workplace, backed by the sample store and
//! Box (or a local image directory).

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trafficnet_common::config::{default_config_path, load_toml_config};
use trafficnet_common::db::{init_database, SampleStore};
use trafficnet_labeler::config::{Args, LabelerConfig};
use trafficnet_labeler::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // TOML is read before tracing exists so its log level can seed the filter
    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path().filter(|p| p.exists()));
    let settings = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration file")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting TrafficNet Labeler v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => warn!("No labeler.toml found, using compiled defaults"),
    }

    let config = LabelerConfig::resolve(args, settings).context("Invalid configuration")?;

    let pool = match init_database(&config.database_url, &config.collection).await {
        Ok(pool) => {
            info!(collection = %config.collection, "Connected to sample store");
            pool
        }
        Err(e) => {
            error!("Failed to open sample store: {}", e);
            return Err(e.into());
        }
    };
    let store = SampleStore::new(pool, config.collection.clone())?;

    let blobs = config
        .blob
        .open()
        .context("Failed to initialize blob storage")?;
    info!(backend = blobs.name(), "Blob storage ready");

    let workplaces: Vec<&str> = config
        .settings
        .workplaces
        .iter()
        .map(|w| w.id.as_str())
        .collect();
    info!(workplaces = ?workplaces, "Serving workplaces");

    let state = AppState::new(config.settings.clone(), store, blobs, &config.passkey);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("trafficnet-labeler listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
