// Watches the service config and API key files and swaps in new versions

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{RwLock, mpsc};
use tracing::{error, info, warn};

use crate::{
    config::{ApiKeyStore, AppConfig},
    constants::hot_reload as hr_constants,
    errors::AppError,
};

#[derive(Debug, thiserror::Error)]
pub enum HotReloadError {
    #[error("Path resolution failed: {0}")]
    PathResolution(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Watcher creation failed: {0}")]
    WatcherCreation(String),

    #[error("File watching failed: {0}")]
    FileWatching(String),

    #[error("Config reload failed: {0}")]
    ConfigReload(String),
}

impl From<HotReloadError> for AppError {
    fn from(error: HotReloadError) -> Self {
        AppError::HotReloadError(error.to_string())
    }
}

fn resolve_and_verify_path(path: &Path) -> Result<PathBuf, HotReloadError> {
    let resolved = fs::canonicalize(path).map_err(|e| {
        HotReloadError::PathResolution(format!("Failed to resolve path {:?}: {}", path, e))
    })?;
    if !resolved.is_file() {
        return Err(HotReloadError::FileNotFound(resolved));
    }
    Ok(resolved)
}

/// Replaces the live config only if the new file parses and validates.
pub async fn reload_config(path: &Path, config: &RwLock<AppConfig>) -> Result<(), HotReloadError> {
    let new_config = AppConfig::load(path).map_err(|e| HotReloadError::ConfigReload(format!("{:#}", e)))?;

    let mut current = config.write().await;
    if current.server.addr != new_config.server.addr {
        warn!(
            old = %current.server.addr,
            new = %new_config.server.addr,
            "server.addr changed; takes effect after restart"
        );
    }
    *current = new_config;
    Ok(())
}

pub async fn reload_api_keys(path: &Path, key_store: &RwLock<ApiKeyStore>) -> Result<(), HotReloadError> {
    let new_store = ApiKeyStore::load(path).map_err(|e| HotReloadError::ConfigReload(format!("{:#}", e)))?;
    *key_store.write().await = new_store;
    Ok(())
}

/// Runs until the watcher channel closes. Changes arriving within the
/// debounce window are coalesced into one reload per file.
pub async fn watch_config_files(
    config_path: PathBuf,
    config: Arc<RwLock<AppConfig>>,
    key_store: Arc<RwLock<ApiKeyStore>>,
) -> Result<(), AppError> {
    let key_store_path = PathBuf::from(config.read().await.identity.api_key_store_path.clone());

    let config_path = resolve_and_verify_path(&config_path)?;
    let key_store_path = resolve_and_verify_path(&key_store_path)?;
    info!(config_path = ?config_path, key_store_path = ?key_store_path, "Starting configuration file watcher");

    let (tx, mut rx) = mpsc::channel::<Event>(hr_constants::CHANNEL_BUFFER_SIZE);
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                // Non-blocking: this callback runs on the notify thread
                if let Err(e) = tx.try_send(event) {
                    warn!("Failed to queue file change event: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("File watcher error: {}", e),
        },
        notify::Config::default(),
    )
    .map_err(|e| HotReloadError::WatcherCreation(e.to_string()))?;

    // Watch parent directories: editors often replace files by rename.
    let directories: HashSet<PathBuf> = [&config_path, &key_store_path]
        .iter()
        .filter_map(|p| p.parent().map(Path::to_path_buf))
        .collect();
    for dir in &directories {
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| HotReloadError::FileWatching(format!("{}: {}", dir.display(), e)))?;
    }

    let debounce = Duration::from_millis(hr_constants::DEBOUNCE_MILLIS);
    while let Some(first) = rx.recv().await {
        let mut changed: HashSet<PathBuf> = first.paths.into_iter().collect();
        tokio::time::sleep(debounce).await;
        while let Ok(event) = rx.try_recv() {
            changed.extend(event.paths);
        }

        if changed.contains(&config_path) {
            match reload_config(&config_path, &config).await {
                Ok(()) => info!("Configuration reloaded"),
                Err(e) => error!("{}. Keeping previous configuration.", e),
            }
        }
        if changed.contains(&key_store_path) {
            match reload_api_keys(&key_store_path, &key_store).await {
                Ok(()) => info!("API key store reloaded"),
                Err(e) => error!("{}. Keeping previous API keys.", e),
            }
        }
    }

    Ok(())
}
