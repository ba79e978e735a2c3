use std::sync::Arc;

use axum_prometheus::metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

use crate::{
    config::{ApiKeyStore, AppConfig, SecretsConfig},
    features::{
        rate_limiter::{InMemoryRateLimitState, RateLimitState},
        tenants::{Repository, TenantService},
    },
};

pub struct AppState {
    pub config: Arc<RwLock<AppConfig>>,
    pub secrets: Arc<SecretsConfig>,
    pub key_store: Arc<RwLock<ApiKeyStore>>,
    pub rate_limit_store: Arc<dyn RateLimitState>,
    pub tenants: Arc<TenantService>,
    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires the in-process stores from a loaded configuration.
    pub fn new(
        config: AppConfig,
        secrets: SecretsConfig,
        key_store: ApiKeyStore,
        repository: Arc<dyn Repository>,
        prometheus_handle: Option<PrometheusHandle>,
    ) -> Self {
        let rate_limit_store: Arc<dyn RateLimitState> = Arc::new(
            InMemoryRateLimitState::with_cleanup_interval(config.rate_limits.cleanup_interval),
        );
        let tenants = Arc::new(TenantService::new(repository, config.cache.ttl));

        Self {
            config: Arc::new(RwLock::new(config)),
            secrets: Arc::new(secrets),
            key_store: Arc::new(RwLock::new(key_store)),
            rate_limit_store,
            tenants,
            prometheus_handle,
        }
    }
}
