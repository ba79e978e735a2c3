//! Duration parsing utilities.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tokio::time::Instant;

use crate::constants::time;

/// Parses a duration string like "30s", "5m", "1h", "1d" into a Duration.
///
/// # Arguments
/// * `s` - Duration string (e.g., "30s", "5m", "1h")
///
/// # Returns
/// * `Ok(Duration)` on success
/// * `Err(&str)` with error message on failure
pub fn parse_duration(s: &str) -> Result<Duration, &'static str> {
    let s = s.trim();
    let unit = s.chars().last().ok_or("Empty duration")?;
    let value: u64 = s[..s.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| "Invalid number in duration")?;

    let multiplier = match unit {
        's' => 1,
        'm' => time::SECONDS_PER_MINUTE,
        'h' => time::SECONDS_PER_HOUR,
        'd' => time::SECONDS_PER_DAY,
        _ => return Err("Invalid duration unit"),
    };
    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or("Duration out of range")
}

/// Serde adapter so config files can say `period: "15m"`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(|e| serde::de::Error::custom(format!("{e}: {raw:?}")))
}

/// Whole seconds, rounded up. Used for `Retry-After` style headers.
pub fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Longest deadline handed out; `Instant + Duration::MAX` would panic.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * time::SECONDS_PER_DAY);

/// `start + after`, capped instead of overflowing.
pub fn deadline_after(start: Instant, after: Duration) -> Instant {
    start
        .checked_add(after.min(FAR_FUTURE))
        .unwrap_or(start)
}
