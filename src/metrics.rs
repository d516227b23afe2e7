// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the activity cache.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `activity_cache_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `outcome`: yielding, empty, error
//! - `query`: by_entry_id, by_user_id, recent
//! - `result`: hit, miss, error

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record the end of a sync cycle
pub fn record_sync(outcome: &str) {
    counter!(
        "activity_cache_syncs_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record source fetch latency
pub fn record_fetch_latency(duration: Duration) {
    histogram!("activity_cache_fetch_seconds").record(duration.as_secs_f64());
}

/// Record the shape of a merged batch
pub fn record_merge(received: usize, duplicates: usize, evicted: usize) {
    counter!("activity_cache_records_received_total").increment(received as u64);
    counter!("activity_cache_duplicates_total").increment(duplicates as u64);
    counter!("activity_cache_evictions_total").increment(evicted as u64);
}

/// Set current number of live entries
pub fn set_entries(count: usize) {
    gauge!("activity_cache_entries").set(count as f64);
}

/// Record a caller that waited on somebody else's sync
pub fn record_sync_waiter() {
    counter!("activity_cache_sync_waiters_total").increment(1);
}

/// Record a query against the cache
pub fn record_query(query: &str, result: &str) {
    counter!(
        "activity_cache_queries_total",
        "query" => query.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
}

/// A timing guard that records fetch latency on drop
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_fetch_latency(self.start.elapsed());
    }
}
