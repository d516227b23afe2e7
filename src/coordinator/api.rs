// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query surface.
//!
//! Every query first makes sure the cache is fresh (see
//! [`ActivityCache::maybe_sync`]) and then returns owned copies, so callers
//! never hold a view into live cache state.

use std::sync::atomic::Ordering;

use tokio::time::Instant;

use crate::metrics;
use crate::record::ActivityRecord;

use super::{ActivityCache, CacheError, CacheStats};

impl ActivityCache {
    /// Look up a record by its upstream ID.
    ///
    /// `Ok(None)` when the record is not cached (never seen, or evicted).
    ///
    /// # Example
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use activity_cache::{ActivityCache, ActivityCacheConfig, MemorySource};
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let source = Arc::new(MemorySource::new());
    /// let pushed = source.push_now(Some("user-a"));
    /// let cache = ActivityCache::new(source, ActivityCacheConfig::default()).unwrap();
    ///
    /// assert_eq!(cache.by_entry_id(pushed.id).await.unwrap(), Some(pushed));
    /// assert_eq!(cache.by_entry_id(9999).await.unwrap(), None);
    /// # }
    /// ```
    pub async fn by_entry_id(&self, id: i64) -> Result<Option<ActivityRecord>, CacheError> {
        if let Err(e) = self.maybe_sync().await {
            metrics::record_query("by_entry_id", "error");
            return Err(e);
        }
        let found = self.inner.read().ring.get_by_id(id).cloned();
        metrics::record_query("by_entry_id", if found.is_some() { "hit" } else { "miss" });
        Ok(found)
    }

    /// All live records referencing `user_id`, newest first.
    ///
    /// Empty when the user has no cached records.
    pub async fn by_user_id(&self, user_id: &str) -> Result<Vec<ActivityRecord>, CacheError> {
        if let Err(e) = self.maybe_sync().await {
            metrics::record_query("by_user_id", "error");
            return Err(e);
        }
        let records: Vec<ActivityRecord> = self
            .inner
            .read()
            .ring
            .records_for_user(user_id)
            .cloned()
            .collect();
        metrics::record_query("by_user_id", if records.is_empty() { "miss" } else { "hit" });
        Ok(records)
    }

    /// Up to `limit` of the newest live records.
    pub async fn recent(&self, limit: usize) -> Result<Vec<ActivityRecord>, CacheError> {
        if let Err(e) = self.maybe_sync().await {
            metrics::record_query("recent", "error");
            return Err(e);
        }
        let records: Vec<ActivityRecord> = self.inner.read().ring.iter().take(limit).cloned().collect();
        metrics::record_query("recent", if records.is_empty() { "miss" } else { "hit" });
        Ok(records)
    }

    /// Mark the cache stale so the next read syncs.
    ///
    /// Cached records and the incremental fetch cursor are kept.
    pub fn invalidate(&self) {
        self.inner.write().sync.last_sync = None;
    }

    /// Number of live records, without refreshing.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().ring.total()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            total: inner.ring.total(),
            capacity: inner.ring.capacity(),
            users: inner.ring.user_index().user_count(),
            dupes_in_last_sync: inner.sync.dupes_in_last_sync,
            syncs: self.syncs.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failed_fetches: self.failed_fetches.load(Ordering::Relaxed),
            last_sync_age: inner.sync.last_sync.map(|t| Instant::now().saturating_duration_since(t)),
            last_yielding_sync: inner.sync.last_yielding_sync,
        }
    }
}
