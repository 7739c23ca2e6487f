//! Idempotency marker lifetime.

use std::time::Duration;

/// Configuration for idempotency behaviour.
///
/// Controls how long a consumed key keeps rejecting replays.
///
/// # Example
///
/// ```
/// # use segments::domain::IdempotencyConfig;
/// # use std::time::Duration;
/// let config = IdempotencyConfig::default();
/// assert_eq!(config.ttl(), Duration::from_secs(60 * 60));
///
/// let clamped = IdempotencyConfig::from_minutes(0);
/// assert_eq!(clamped.ttl(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyConfig {
    ttl: Duration,
}

impl IdempotencyConfig {
    /// Default TTL in minutes.
    pub const DEFAULT_TTL_MINUTES: u64 = 60;

    /// Minimum allowed TTL in minutes.
    const MIN_TTL_MINUTES: u64 = 1;

    /// Maximum allowed TTL in minutes (one week).
    const MAX_TTL_MINUTES: u64 = 7 * 24 * 60;

    /// Build from a configured number of minutes, clamped to
    /// [1, 10080].
    pub fn from_minutes(minutes: u64) -> Self {
        let minutes = minutes.clamp(Self::MIN_TTL_MINUTES, Self::MAX_TTL_MINUTES);
        Self {
            ttl: Duration::from_secs(minutes * 60),
        }
    }

    /// Create with explicit TTL (for testing).
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Returns the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self::from_minutes(Self::DEFAULT_TTL_MINUTES)
    }
}
