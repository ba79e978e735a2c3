//! # Markethub tenant API
//!
//! Backend service for a multi-tenant marketing-automation product, built
//! with Axum:
//! - Organizations (tenants) and their Instagram / Facebook / TikTok connections
//! - Fixed-window rate limiting per path policy and client IP
//! - In-process TTL cache in front of tenant reads
//! - JWT and API key authentication
//! - Hot configuration reload
//! - Prometheus metrics

pub mod app;
pub mod config;
pub mod constants;
pub mod errors;
pub mod features;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod utils;

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
    config::{ApiKeyStore, AppConfig, SecretsConfig},
    features::tenants::InMemoryRepository,
    state::AppState,
    utils::{hot_reload, logging::*},
};

/// Starts the service with the given configuration file.
///
/// # Arguments
/// * `config_path` - Path to the marketing.yaml configuration file
///
/// # Returns
/// * `Result<()>` - Ok once the server has shut down cleanly
pub async fn run(config_path: PathBuf) -> Result<()> {
    dotenv().ok();
    init_tracing();

    log_startup("secrets", "loading", None);
    let secrets = SecretsConfig::from_env()?;
    log_startup("secrets", "loaded", None);

    log_startup("configuration", "loading", config_path.to_str());
    let config = AppConfig::load(&config_path)?;
    log_startup("configuration", "loaded", None);

    log_info("Loading API key store", "startup", "api_key_store_loading");
    let key_store = ApiKeyStore::load(&config.identity.api_key_store_path)?;

    let addr = config.server.addr.clone();
    let cache_sweep_interval = config.cache.sweep_interval;
    let rate_limit_cleanup_interval = config.rate_limits.cleanup_interval;

    let (prometheus_layer, prometheus_handle) = app::metrics_pair(&config);

    let state = Arc::new(AppState::new(
        config,
        secrets,
        key_store,
        Arc::new(InMemoryRepository::new()),
        prometheus_handle,
    ));

    spawn_maintenance_tasks(state.clone(), cache_sweep_interval, rate_limit_cleanup_interval);

    let config_for_spawn = state.config.clone();
    let key_store_for_spawn = state.key_store.clone();
    tokio::spawn(async move {
        // The server keeps running with its current config if the watcher dies.
        if let Err(e) = hot_reload::watch_config_files(config_path, config_for_spawn, key_store_for_spawn).await {
            error!("Hot reload watcher failed: {}. Configuration changes will not be reloaded.", e);
        }
    });

    let mut app = app::create_app(state)?;
    if let Some(layer) = prometheus_layer {
        app = app.layer(layer);
    }

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", &addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Background sweeps for the TTL cache and the rate limiter windows.
fn spawn_maintenance_tasks(state: Arc<AppState>, cache_sweep: Duration, rate_limit_cleanup: Duration) {
    let tenants = state.tenants.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cache_sweep);
        loop {
            interval.tick().await;
            let purged = tenants.purge_expired();
            let stats = tenants.cache_stats();
            log_performance_metric("cache_entries_purged", purged as f64, "count", "cleanup");
            log_performance_metric(
                "cache_entries",
                (stats.organizations.entries + stats.connections.entries) as f64,
                "count",
                "monitoring",
            );
        }
    });

    let rate_limit_store = state.rate_limit_store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(rate_limit_cleanup);
        loop {
            interval.tick().await;
            rate_limit_store.cleanup_expired_windows();
            log_performance_metric(
                "rate_limit_windows",
                rate_limit_store.active_windows() as f64,
                "count",
                "cleanup",
            );
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
