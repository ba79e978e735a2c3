use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::{
    constants::rate_limiter as rl_constants,
    utils::duration::{ceil_secs, deadline_after},
};

/// Outcome of a single `check_rate_limit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Time until the current window closes.
    pub reset_after: Duration,
    /// Set only on rejection.
    pub retry_after: Option<Duration>,
}

impl RateLimitDecision {
    fn allowed(limit: u64, remaining: u64, reset_after: Duration) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            reset_after,
            retry_after: None,
        }
    }

    fn rejected(limit: u64, reset_after: Duration) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset_after,
            retry_after: Some(reset_after),
        }
    }

    /// Retry-after in whole seconds, never below one.
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after.map(|d| ceil_secs(d).max(1)).unwrap_or(0)
    }

    pub fn reset_after_secs(&self) -> u64 {
        ceil_secs(self.reset_after)
    }
}

pub trait RateLimitState: Send + Sync {
    /// Count one request against `key` in a fixed window of `window` length.
    fn check_rate_limit(&self, key: &str, max_requests: u64, window: Duration) -> RateLimitDecision;
    /// Remove windows that have already closed. Returns how many were dropped.
    fn cleanup_expired_windows(&self) -> usize;
    /// Current number of tracked windows, for monitoring.
    fn active_windows(&self) -> usize;
}

struct Window {
    count: u64,
    reset_at: Instant,
}

/// Process-local fixed-window counter.
pub struct InMemoryRateLimitState {
    windows: DashMap<String, Window>,
    cleanup_interval: Duration,
    origin: Instant,
    last_cleanup_ms: AtomicU64,
}

impl Default for InMemoryRateLimitState {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRateLimitState {
    pub fn new() -> Self {
        Self::with_cleanup_interval(Duration::from_secs(rl_constants::CLEANUP_INTERVAL_SECONDS))
    }

    pub fn with_cleanup_interval(cleanup_interval: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            cleanup_interval,
            origin: Instant::now(),
            last_cleanup_ms: AtomicU64::new(0),
        }
    }

    /// Sweeps closed windows if the last sweep is older than the cleanup
    /// interval. Only the caller that wins the exchange does the work.
    fn maybe_cleanup(&self, now: Instant) {
        let now_ms = now.duration_since(self.origin).as_millis() as u64;
        let last = self.last_cleanup_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) < self.cleanup_interval.as_millis() as u64 {
            return;
        }
        if self
            .last_cleanup_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.perform_cleanup(now);
        }
    }

    fn perform_cleanup(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.windows.retain(|_, window| {
            let keep = window.reset_at >= now;
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            tracing::debug!(removed, "Cleaned up expired rate limit windows");
        }
        removed
    }
}

impl RateLimitState for InMemoryRateLimitState {
    fn check_rate_limit(&self, key: &str, max_requests: u64, window: Duration) -> RateLimitDecision {
        let now = Instant::now();
        // Must run before taking the entry lock below; retain() locks every shard.
        self.maybe_cleanup(now);

        if max_requests == 0 {
            return RateLimitDecision::rejected(0, window);
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            count: 0,
            reset_at: deadline_after(now, window),
        });
        let current = entry.value_mut();

        if current.count == 0 || now > current.reset_at {
            current.count = 1;
            current.reset_at = deadline_after(now, window);
            return RateLimitDecision::allowed(max_requests, max_requests - 1, window);
        }

        let reset_after = current.reset_at.saturating_duration_since(now);
        if current.count >= max_requests {
            return RateLimitDecision::rejected(max_requests, reset_after);
        }

        current.count += 1;
        RateLimitDecision::allowed(max_requests, max_requests - current.count, reset_after)
    }

    fn cleanup_expired_windows(&self) -> usize {
        self.perform_cleanup(Instant::now())
    }

    fn active_windows(&self) -> usize {
        self.windows.len()
    }
}
