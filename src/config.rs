// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the activity cache.
//!
//! # Example
//!
//! ```
//! use activity_cache::ActivityCacheConfig;
//!
//! // Defaults: ~1 MB of records, 1s freshness window
//! let config = ActivityCacheConfig::default();
//! assert_eq!(config.capacity, 6250);
//!
//! // Small cache that refreshes aggressively
//! let config = ActivityCacheConfig {
//!     capacity: 500,
//!     wait_for_sync_timeout_ms: 50,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::coordinator::CacheError;
use crate::resilience::retry::RetryConfig;

/// Approximate in-memory size of one record, used to size the default ring.
pub const APPROX_RECORD_BYTES: usize = 160;

/// Configuration for an [`ActivityCache`](crate::ActivityCache).
///
/// All fields have defaults, so a config can be deserialized from a partial
/// document.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityCacheConfig {
    /// Number of record slots (default: 1 MB / 160 bytes = 6250)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// How long a sync keeps the cache fresh (default: 1000 ms)
    #[serde(default = "default_wait_for_sync_timeout_ms")]
    pub wait_for_sync_timeout_ms: u64,

    /// Ask the source only for records that reference a user
    #[serde(default = "default_require_user_id")]
    pub require_user_id: bool,

    /// Initial allocation of each per-user slot list
    #[serde(default = "default_user_list_base_capacity")]
    pub user_list_base_capacity: usize,

    /// Cap on each per-user slot list (None = unbounded)
    #[serde(default)]
    pub user_list_limit: Option<usize>,

    /// How far behind the last yielding sync the fetch cursor is placed.
    /// Re-requested records are discarded as duplicates and counted in
    /// `dupes_in_last_sync`. `0` asks strictly for records after the cursor,
    /// which can miss records dated in the same millisecond as a sync start.
    #[serde(default = "default_cursor_overlap_ms")]
    pub cursor_overlap_ms: u64,

    /// Fetch attempts per sync (1 = no retry)
    #[serde(default = "default_fetch_max_attempts")]
    pub fetch_max_attempts: usize,

    /// Delay before the first fetch retry, doubled on each further retry
    #[serde(default = "default_fetch_retry_delay_ms")]
    pub fetch_retry_delay_ms: u64,
}

fn default_capacity() -> usize { 1_000_000 / APPROX_RECORD_BYTES } // ~1 MB
fn default_wait_for_sync_timeout_ms() -> u64 { 1000 }
fn default_require_user_id() -> bool { true }
fn default_user_list_base_capacity() -> usize { 128 }
fn default_cursor_overlap_ms() -> u64 { 1000 }
fn default_fetch_max_attempts() -> usize { 1 }
fn default_fetch_retry_delay_ms() -> u64 { 100 }

impl Default for ActivityCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            wait_for_sync_timeout_ms: default_wait_for_sync_timeout_ms(),
            require_user_id: default_require_user_id(),
            user_list_base_capacity: default_user_list_base_capacity(),
            user_list_limit: None,
            cursor_overlap_ms: default_cursor_overlap_ms(),
            fetch_max_attempts: default_fetch_max_attempts(),
            fetch_retry_delay_ms: default_fetch_retry_delay_ms(),
        }
    }
}

impl ActivityCacheConfig {
    /// Reject settings the cache cannot run with.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig("capacity must be at least 1".into()));
        }
        if self.fetch_max_attempts == 0 {
            return Err(CacheError::InvalidConfig("fetch_max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn wait_for_sync_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_for_sync_timeout_ms)
    }

    /// Retry policy for source fetches.
    #[must_use]
    pub fn fetch_retry(&self) -> RetryConfig {
        let initial_delay = Duration::from_millis(self.fetch_retry_delay_ms);
        RetryConfig {
            initial_delay,
            max_delay: initial_delay.saturating_mul(16),
            factor: 2.0,
            max_retries: self.fetch_max_attempts.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ActivityCacheConfig::default();
        assert_eq!(config.capacity, 6250);
        assert_eq!(config.wait_for_sync_timeout(), Duration::from_secs(1));
        assert!(config.require_user_id);
        assert_eq!(config.user_list_base_capacity, 128);
        assert_eq!(config.user_list_limit, None);
        assert_eq!(config.fetch_max_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ActivityCacheConfig =
            serde_json::from_value(json!({"capacity": 10, "user_list_limit": 4})).unwrap();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.user_list_limit, Some(4));
        assert_eq!(config.wait_for_sync_timeout_ms, 1000);
        assert_eq!(config.cursor_overlap_ms, 1000);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = ActivityCacheConfig { capacity: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = ActivityCacheConfig { fetch_max_attempts: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_fetch_retry_policy() {
        let config = ActivityCacheConfig {
            fetch_max_attempts: 3,
            fetch_retry_delay_ms: 10,
            ..Default::default()
        };
        let retry = config.fetch_retry();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.initial_delay, Duration::from_millis(10));
        assert_eq!(retry.max_delay, Duration::from_millis(160));
    }
}
