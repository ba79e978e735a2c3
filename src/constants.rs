// Application-wide constants

/// Tenant data cache configuration
pub mod cache {
    pub const DEFAULT_TTL_SECONDS: u64 = 300; // 5 minutes
    pub const SWEEP_INTERVAL_SECONDS: u64 = 60;
}

/// Rate limiter configuration
pub mod rate_limiter {
    pub const CLEANUP_INTERVAL_SECONDS: u64 = 60;
}

/// Hot reload configuration
pub mod hot_reload {
    pub const CHANNEL_BUFFER_SIZE: usize = 32;
    pub const DEBOUNCE_MILLIS: u64 = 200;
}

/// Validation limits for tenant data
pub mod validation {
    pub const MAX_ORGANIZATION_NAME_LENGTH: usize = 100;
    pub const MAX_ACCOUNT_NAME_LENGTH: usize = 200;
}

/// Time conversion helpers
pub mod time {
    pub const SECONDS_PER_MINUTE: u64 = 60;
    pub const SECONDS_PER_HOUR: u64 = 3600;
    pub const SECONDS_PER_DAY: u64 = 86_400;
    /// Upper bound for any duration in the config file.
    pub const MAX_CONFIG_DURATION_SECONDS: u64 = 365 * SECONDS_PER_DAY;
}
