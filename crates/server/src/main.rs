mod bootstrap;
mod error;
mod health;
mod jobs;
mod orders;
mod recommendations;
mod state;

use std::future::IntoFuture;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use navigator_core::config::{AppConfig, LoadOptions};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::state::AppState;

fn init_logging(config: &AppConfig) {
    use navigator_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

/// Every HTTP route. When `static_dir` holds a built client bundle, unknown
/// paths serve its files and fall back to `index.html` for client routing.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .merge(recommendations::router())
        .merge(orders::router())
        .merge(jobs::router())
        .merge(health::router())
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => api,
    };
    app.layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let server = &app.config.server;
    let address = format!("{}:{}", server.bind_address, server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    let static_dir = server.static_dir.as_deref().filter(|dir| dir.join("index.html").is_file());
    if let (Some(configured), None) = (&server.static_dir, static_dir) {
        tracing::warn!(
            event_name = "system.server.static_dir_missing",
            correlation_id = "bootstrap",
            static_dir = %configured.display(),
            "static_dir has no index.html, client bundle not served"
        );
    }

    let (stop, mut stopped) = tokio::sync::watch::channel(false);
    let serving = axum::serve(listener, router(app.state.clone(), static_dir))
        .with_graceful_shutdown(async move {
            let _ = stopped.changed().await;
        })
        .into_future();
    let handle = tokio::spawn(serving);

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        storage = app.state.storage.as_str(),
        "navigator-server listening"
    );
    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = server.graceful_shutdown_secs,
        "navigator-server stopping"
    );

    let _ = stop.send(true);
    match tokio::time::timeout(Duration::from_secs(server.graceful_shutdown_secs), handle).await {
        Ok(joined) => joined??,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not finish within the grace period"
        ),
    }

    if let Some(pool) = &app.state.db_pool {
        pool.close().await;
    }
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
