//! uwrite-review - Content review provider for the Uwrite similarity API
//!
//! Accepts batches of files from the host, checks each one asynchronously
//! against Uwrite and serves status, score and report links over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};
use uwrite_common::config::{
    resolve_config_path, LoggingConfig, RootFolderInitializer, RootFolderResolver,
};

use uwrite_review::config::ServiceConfig;
use uwrite_review::db::{DbLocaleResolver, SqliteItemStore};
use uwrite_review::services::UwriteClient;
use uwrite_review::{AppState, ContentReviewService};

const MODULE_NAME: &str = "uwrite-review";

/// Command-line arguments for uwrite-review
#[derive(Parser, Debug)]
#[command(name = "uwrite-review")]
#[command(about = "Uwrite content review service")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "UWRITE_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder (database, submitted files)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long, env = "UWRITE_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing before config loading so its warnings are visible;
    // the configured level replaces the default once known unless RUST_LOG is set
    let env_filter = EnvFilter::try_from_default_env().ok();
    let level_from_env = env_filter.is_some();
    let (filter, filter_handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| level_filter(&LoggingConfig::default().level)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = resolve_config_path(args.config.as_deref(), MODULE_NAME);
    let config = ServiceConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;

    if !level_from_env {
        if let Err(e) = filter_handle.reload(level_filter(&config.logging.level)) {
            warn!("Failed to apply log level {}: {}", config.logging.level, e);
        }
    }

    info!("Starting {} version {}", MODULE_NAME, env!("CARGO_PKG_VERSION"));

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder)
        .with_toml_value(config.root_folder.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = uwrite_review::db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;

    let client = UwriteClient::new(&config.uwrite).context("Failed to build Uwrite client")?;
    let service = ContentReviewService::new(
        &config.uwrite,
        Arc::new(SqliteItemStore::new(db_pool.clone())),
        Arc::new(client),
        Arc::new(DbLocaleResolver::new(db_pool.clone())),
    );

    let state = AppState::new(db_pool, service.clone(), root_folder);
    let app = uwrite_review::build_router(state);

    let bind = args.bind.unwrap_or_else(|| config.bind_address().to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // No new submissions past this point; let running checks finish
    service.shutdown().await;

    info!("Shutdown complete");
    Ok(())
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("uwrite_review={},uwrite_common={},tower_http=info", level, level))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
