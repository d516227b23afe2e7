// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Freshness check, single-flight sync and merge.
//!
//! One sync runs at a time. The caller that finds the cache stale with no
//! sync running becomes the initiator: it installs a `watch` channel in
//! `in_flight`, fetches with no lock held, merges under the write lock and
//! publishes its result. Callers arriving meanwhile clone the receiver and
//! wait for that one result.

use std::collections::HashSet;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::metrics;
use crate::record::{now_millis, ActivityRecord};
use crate::resilience::retry::retry;
use crate::source::FetchRequest;

use super::{ActivityCache, CacheError, CacheInner, SyncOutcome, SyncReport, SyncResult, SyncSignal};

enum Role {
    Initiator(watch::Sender<Option<SyncResult>>),
    Waiter(SyncSignal),
}

/// Clears `in_flight` when the initiator finishes or is dropped mid-sync.
///
/// Dropping without [`finish`](Self::finish) closes the channel, so waiters
/// wake up and race for the slot instead of hanging.
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<SyncSignal>>,
    tx: Option<watch::Sender<Option<SyncResult>>>,
}

impl InFlightGuard<'_> {
    fn finish(mut self, result: SyncResult) {
        if let Some(tx) = self.tx.take() {
            tx.send_replace(Some(result));
            *self.slot.lock() = None;
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.tx.take().is_some() {
            *self.slot.lock() = None;
        }
    }
}

impl CacheInner {
    /// Merge a newest-first batch.
    ///
    /// Everything from the first already-cached ID onwards is treated as a
    /// resend and dropped, as is anything from an ID repeated within the
    /// batch. This assumes the source never places an old ID ahead of
    /// genuinely new ones.
    pub(crate) fn merge(&mut self, batch: &[ActivityRecord]) -> SyncReport {
        let mut seen = HashSet::with_capacity(batch.len());
        let fresh = batch
            .iter()
            .position(|r| self.ring.contains_id(r.id) || !seen.insert(r.id))
            .unwrap_or(batch.len());
        let inserted = self.ring.insert(&batch[..fresh]);

        SyncReport {
            received: batch.len(),
            new: inserted.written,
            duplicates: batch.len() - fresh,
            evicted: inserted.evicted,
            total: self.ring.total(),
        }
    }
}

impl ActivityCache {
    /// Whether the last sync is recent enough to read without fetching.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        let timeout = self.config.wait_for_sync_timeout();
        self.inner
            .read()
            .sync
            .last_sync
            .map_or(false, |last| Instant::now() <= last + timeout)
    }

    /// Return once the cache is fit to read: immediately if fresh, after
    /// running a sync if stale, or after waiting for somebody else's sync
    /// if one is already running.
    ///
    /// If the sync being waited on is abandoned (its initiator was
    /// cancelled), the waiter goes round again and either starts the next
    /// sync or joins whoever did. Only a failed fetch yields an error.
    #[tracing::instrument(skip(self))]
    pub async fn maybe_sync(&self) -> Result<SyncOutcome, CacheError> {
        loop {
            if self.is_fresh() {
                return Ok(SyncOutcome::Fresh);
            }

            let role = {
                let mut in_flight = self.in_flight.lock();
                if let Some(signal) = in_flight.as_ref() {
                    Role::Waiter(signal.clone())
                } else if self.is_fresh() {
                    // A sync finished between the first check and taking the lock
                    return Ok(SyncOutcome::Fresh);
                } else {
                    let (tx, rx) = watch::channel(None);
                    *in_flight = Some(rx);
                    Role::Initiator(tx)
                }
            };

            match role {
                Role::Waiter(signal) => match self.wait_for_sync(signal).await {
                    Some(result) => return result.map(SyncOutcome::Joined),
                    None => debug!("In-flight sync was abandoned, retrying"),
                },
                Role::Initiator(tx) => {
                    let guard = InFlightGuard { slot: &self.in_flight, tx: Some(tx) };
                    let result = self.sync_once().await;
                    guard.finish(result.clone());
                    return result.map(SyncOutcome::Synced);
                }
            }
        }
    }

    /// Wait for the in-flight sync. `None` if it was abandoned unfinished.
    async fn wait_for_sync(&self, mut signal: SyncSignal) -> Option<SyncResult> {
        metrics::record_sync_waiter();
        trace!("Sync already in flight, waiting for it");

        match signal.wait_for(Option::is_some).await {
            Ok(result) => (*result).clone(),
            Err(_) => None,
        }
    }

    /// Fetch everything since the last yielding sync and merge it.
    ///
    /// Nothing is written unless the fetch succeeds.
    async fn sync_once(&self) -> SyncResult {
        let started = Instant::now();
        let started_wall = now_millis();
        let overlap = i64::try_from(self.config.cursor_overlap_ms).unwrap_or(i64::MAX);

        let request = FetchRequest {
            limit: self.config.capacity,
            since: self
                .inner
                .read()
                .sync
                .last_yielding_sync
                .map(|t| t.saturating_sub(overlap)),
            require_user_id: self.config.require_user_id,
        };

        self.fetches.fetch_add(1, Ordering::Relaxed);
        let fetched = {
            let _timer = metrics::LatencyTimer::new();
            retry("fetch_activity", &self.retry, || self.source.fetch(request)).await
        };

        let batch = match fetched {
            Ok(batch) => batch,
            Err(e) => {
                self.failed_fetches.fetch_add(1, Ordering::Relaxed);
                metrics::record_sync("error");
                warn!(error = %e, since = ?request.since, "Activity fetch failed, cache left unchanged");
                return Err(e.into());
            }
        };

        let report = {
            let mut inner = self.inner.write();
            let report = inner.merge(&batch);
            inner.sync.last_sync = Some(started);
            if report.new > 0 {
                inner.sync.last_yielding_sync = Some(started_wall);
            }
            inner.sync.dupes_in_last_sync = report.duplicates;
            report
        };
        self.syncs.fetch_add(1, Ordering::Relaxed);

        metrics::record_sync(if report.new > 0 { "yielding" } else { "empty" });
        metrics::record_merge(report.received, report.duplicates, report.evicted);
        metrics::set_entries(report.total);

        let elapsed = started.elapsed();
        debug!(
            received = report.received,
            new = report.new,
            duplicates = report.duplicates,
            evicted = report.evicted,
            total = report.total,
            elapsed_ms = elapsed.as_millis() as u64,
            records_per_sec = report.received as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
            "Activity cache refresh completed"
        );

        Ok(report)
    }
}
