//! Quire Server
//!
//! Personal website: pages, a blog, bookmarks, a pastebin and a photo
//! gallery, served as HTML, with a small JSON API for the site owner.
//!
//! Uses SQLite (embedded) for content and an in-memory cache for rendered
//! fragments.

mod app;
mod config;
mod extractors;
mod handlers;
mod services;
mod storage;
mod views;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ServerConfig, DEFAULT_JWT_SECRET};
use storage::Database;

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[FATAL] {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(config.log_format) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Quire Server v{}", env!("CARGO_PKG_VERSION"));
    info!("PID: {}", std::process::id());

    if let Err(e) = run_server(config).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` overrides the default filter
fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("{}", e))
}

async fn run_server(config: ServerConfig) -> Result<()> {
    info!(
        "Config loaded: bind={}, data={}",
        config.bind_address,
        config.data_dir.display()
    );
    if config.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("jwt_secret not set, using default (insecure for production)");
    }

    // Ensure data directories exist
    let media_root = config.media_root();
    tokio::fs::create_dir_all(&media_root)
        .await
        .with_context(|| format!("Failed to create media root {}", media_root.display()))?;
    let database_path = config.database_path();
    if let Some(parent) = database_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Initialize SQLite database
    info!("Initializing SQLite database...");
    let db = Arc::new(
        Database::new(&database_path)
            .await
            .context("Failed to initialize database")?,
    );
    info!("SQLite database initialized at: {}", database_path.display());

    let addr = config.socket_addr()?;
    let admin = config.admin_email.clone().zip(config.admin_password.clone());

    info!("Initializing services...");
    let state = app::AppState::new(config, db).context("Failed to initialize services")?;
    info!("Services initialized");

    if let Some((email, password)) = admin {
        state
            .auth_service
            .ensure_admin(&email, &password)
            .await
            .context("Failed to create admin user")?;
    }

    let app = app::router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server ready to accept connections");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
