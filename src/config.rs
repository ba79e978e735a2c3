use std::{collections::HashMap, fs, path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Error, bail};
use serde::Deserialize;

use crate::{constants, utils::duration::deserialize_duration};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limits: RateLimitsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub enum AuthMode {
    Jwt,
    ApiKey,
    /// API key lookup first, JWT otherwise.
    #[default]
    Either,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub api_key_store_path: String,
    #[serde(default)]
    pub mode: AuthMode,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, Error> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        for policy in &self.rate_limits.policies {
            if !policy.path.starts_with('/') {
                bail!("rate limit policy '{}' path must start with '/'", policy.name);
            }
            if policy.period.is_zero() {
                bail!("rate limit policy '{}' has a zero period", policy.name);
            }
            check_duration_bound(&format!("rate limit policy '{}' period", policy.name), policy.period)?;
        }
        check_duration_bound("rate_limits.cleanup_interval", self.rate_limits.cleanup_interval)?;
        if self.cache.ttl.is_zero() {
            bail!("cache ttl must be greater than zero");
        }
        check_duration_bound("cache.ttl", self.cache.ttl)?;
        check_duration_bound("cache.sweep_interval", self.cache.sweep_interval)?;
        Ok(())
    }
}

fn check_duration_bound(field: &str, value: Duration) -> Result<(), Error> {
    let max = Duration::from_secs(constants::time::MAX_CONFIG_DURATION_SECONDS);
    if value > max {
        bail!("{} must be at most {}s, got {}s", field, max.as_secs(), value.as_secs());
    }
    Ok(())
}

// ----- Rate limit config -----

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitPolicy {
    pub name: String,
    /// Path prefix, matched on segment boundaries.
    pub path: String,
    pub requests: u64,
    #[serde(deserialize_with = "deserialize_duration")]
    pub period: Duration,
}

impl RateLimitPolicy {
    fn matches(&self, request_path: &str) -> bool {
        match request_path.strip_prefix(self.path.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.path.ends_with('/'),
            None => false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitsConfig {
    #[serde(
        default = "default_cleanup_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub cleanup_interval: Duration,
    #[serde(default)]
    pub policies: Vec<Arc<RateLimitPolicy>>,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: default_cleanup_interval(),
            policies: Vec::new(),
        }
    }
}

impl RateLimitsConfig {
    /// Longest matching prefix wins.
    pub fn find_policy_for_path(&self, request_path: &str) -> Option<Arc<RateLimitPolicy>> {
        self.policies
            .iter()
            .filter(|p| p.matches(request_path))
            .max_by_key(|p| p.path.len())
            .cloned()
    }
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(constants::rate_limiter::CLEANUP_INTERVAL_SECONDS)
}

// ----- Cache config  ----

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl", deserialize_with = "deserialize_duration")]
    pub ttl: Duration,
    #[serde(
        default = "default_sweep_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(constants::cache::DEFAULT_TTL_SECONDS)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(constants::cache::SWEEP_INTERVAL_SECONDS)
}

//------  Observability config ---------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

//       API key store config    //

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ApiKeyStore {
    pub keys: HashMap<String, ApiKeyDetails>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiKeyDetails {
    pub user_id: String,
    /// Tenant the key acts for. Platform admins usually have none.
    #[serde(default)]
    pub org_id: Option<String>,
    pub roles: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".to_string()
}

impl ApiKeyStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read API key store {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, Error> {
        serde_yaml::from_str(content).map_err(Into::into)
    }
}

//      Secrets Config
pub struct SecretsConfig {
    pub jwt_secret: String,
}

impl SecretsConfig {
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set in .env file"))?,
        })
    }
}
