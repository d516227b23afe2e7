// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Activity cache coordinator.
//!
//! The [`ActivityCache`] ties the pieces together:
//! - a [`RecordSource`] to pull activity from
//! - a [`RingStore`] holding the newest `capacity` records
//! - sync state deciding when and from where to fetch
//!
//! # Freshness
//!
//! ```text
//!   query ──► fresh? ──yes──► read ring
//!               │
//!               no
//!               ▼
//!        sync in flight? ──yes──► wait for its result ──► read ring
//!               │
//!               no
//!               ▼
//!        fetch ─► merge ─► publish result ─► read ring
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use activity_cache::{ActivityCache, ActivityCacheConfig, MemorySource};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let source = Arc::new(MemorySource::new());
//! source.push_now(Some("user-a"));
//!
//! let cache = ActivityCache::new(source.clone(), ActivityCacheConfig::default()).unwrap();
//! let records = cache.by_user_id("user-a").await.unwrap();
//! assert_eq!(records.len(), 1);
//! # }
//! ```

mod types;
mod api;
mod sync;

pub use types::{CacheError, CacheStats, SyncOutcome, SyncReport};

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::ActivityCacheConfig;
use crate::resilience::retry::RetryConfig;
use crate::ring::{RingStore, UserIndex};
use crate::source::RecordSource;

/// Result of one sync cycle as seen by its waiters.
type SyncResult = Result<SyncReport, CacheError>;

/// Receiving end of the in-flight sync's completion signal.
type SyncSignal = watch::Receiver<Option<SyncResult>>;

/// Sync bookkeeping, guarded together with the ring.
#[derive(Debug, Default)]
pub(crate) struct SyncState {
    /// When the last sync completed (successful fetch, new data or not)
    pub(crate) last_sync: Option<Instant>,
    /// Wall-clock start of the last sync that wrote records; the fetch cursor
    pub(crate) last_yielding_sync: Option<i64>,
    pub(crate) dupes_in_last_sync: usize,
}

/// Ring, indexes and sync state. Only the merge step writes to it.
#[derive(Debug)]
pub(crate) struct CacheInner {
    pub(crate) ring: RingStore,
    pub(crate) sync: SyncState,
}

/// Bounded, lazily refreshed mirror of a remote activity log.
///
/// # Thread Safety
///
/// `Send + Sync`; share it behind an `Arc`. Any number of tasks may query
/// concurrently; at most one fetch to the source runs at a time.
pub struct ActivityCache {
    pub(super) config: ActivityCacheConfig,
    pub(super) source: Arc<dyn RecordSource>,
    pub(super) retry: RetryConfig,
    pub(super) inner: RwLock<CacheInner>,
    /// Completion signal of the sync currently running, if any
    pub(super) in_flight: Mutex<Option<SyncSignal>>,
    pub(super) syncs: AtomicU64,
    pub(super) fetches: AtomicU64,
    pub(super) failed_fetches: AtomicU64,
}

impl ActivityCache {
    /// Create an empty cache over `source`.
    ///
    /// Nothing is fetched until the first query or [`maybe_sync`](Self::maybe_sync).
    pub fn new(source: Arc<dyn RecordSource>, config: ActivityCacheConfig) -> Result<Self, CacheError> {
        config.validate()?;

        let users = UserIndex::new(config.user_list_base_capacity, config.user_list_limit);
        let ring = RingStore::with_user_index(config.capacity, users);

        Ok(Self {
            retry: config.fetch_retry(),
            config,
            source,
            inner: RwLock::new(CacheInner {
                ring,
                sync: SyncState::default(),
            }),
            in_flight: Mutex::new(None),
            syncs: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
            failed_fetches: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ActivityCacheConfig {
        &self.config
    }

    /// Run `f` against the ring as it is right now, without refreshing.
    pub fn inspect<R>(&self, f: impl FnOnce(&RingStore) -> R) -> R {
        f(&self.inner.read().ring)
    }
}

impl std::fmt::Debug for ActivityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // in_flight before inner, same order as maybe_sync
        let syncing = self.in_flight.lock().is_some();
        let inner = self.inner.read();
        f.debug_struct("ActivityCache")
            .field("capacity", &inner.ring.capacity())
            .field("total", &inner.ring.total())
            .field("sync", &inner.sync)
            .field("syncing", &syncing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn is_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_cache_is_send_sync() {
        is_send_sync::<ActivityCache>();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ActivityCacheConfig { capacity: 0, ..Default::default() };
        let result = ActivityCache::new(Arc::new(MemorySource::new()), config);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_cache_is_empty() {
        let config = ActivityCacheConfig { capacity: 8, ..Default::default() };
        let cache = ActivityCache::new(Arc::new(MemorySource::new()), config).unwrap();

        cache.inspect(|ring| {
            assert_eq!(ring.capacity(), 8);
            assert!(ring.is_empty());
            assert_eq!(ring.start(), None);
            ring.debug_validate_invariants();
        });
        assert!(format!("{:?}", cache).contains("total: 0"));
    }
}
