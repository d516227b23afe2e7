// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public types for the activity cache coordinator.

use std::time::Duration;

use thiserror::Error;

use crate::source::SourceError;

/// Errors surfaced by cache queries.
///
/// Only a failed refresh produces an error; a missing record is `Ok(None)`
/// or an empty list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The fetch backing this refresh failed. Shared by every caller that
    /// waited on the same refresh.
    #[error("activity sync failed: {0}")]
    Source(#[from] SourceError),
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// What one sync cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Records returned by the source
    pub received: usize,
    /// Records written to the ring
    pub new: usize,
    /// Records discarded because they were already cached
    pub duplicates: usize,
    /// Live records overwritten
    pub evicted: usize,
    /// Live records after the merge
    pub total: usize,
}

/// How [`ActivityCache::maybe_sync`](super::ActivityCache::maybe_sync) got
/// the cache into a readable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Cache was fresh; nothing fetched
    Fresh,
    /// This caller ran the sync
    Synced(SyncReport),
    /// Another caller's sync was already running; this is its result
    Joined(SyncReport),
}

impl SyncOutcome {
    #[must_use]
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Fresh => None,
            Self::Synced(report) | Self::Joined(report) => Some(report),
        }
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fresh => write!(f, "Fresh"),
            Self::Synced(r) => write!(f, "Synced(new={}, dupes={})", r.new, r.duplicates),
            Self::Joined(r) => write!(f, "Joined(new={}, dupes={})", r.new, r.duplicates),
        }
    }
}

/// Point-in-time view of cache counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub capacity: usize,
    /// Users with at least one live record
    pub users: usize,
    /// Records the last sync discarded as already cached. With a non-zero
    /// `cursor_overlap_ms` this includes the re-requested overlap window, so
    /// a well-behaved source still shows a baseline here.
    pub dupes_in_last_sync: usize,
    /// Completed syncs
    pub syncs: u64,
    /// Fetches issued to the source (including failures)
    pub fetches: u64,
    pub failed_fetches: u64,
    /// Time since the last completed sync
    pub last_sync_age: Option<Duration>,
    /// Wall-clock start (epoch millis) of the last sync that produced new records
    pub last_yielding_sync: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_outcome_display() {
        let report = SyncReport { received: 5, new: 3, duplicates: 2, evicted: 0, total: 3 };
        assert_eq!(format!("{}", SyncOutcome::Fresh), "Fresh");
        assert_eq!(format!("{}", SyncOutcome::Synced(report)), "Synced(new=3, dupes=2)");
        assert_eq!(format!("{}", SyncOutcome::Joined(report)), "Joined(new=3, dupes=2)");
    }

    #[test]
    fn test_sync_outcome_report() {
        assert!(SyncOutcome::Fresh.report().is_none());
        let report = SyncReport { new: 1, ..Default::default() };
        assert_eq!(SyncOutcome::Joined(report).report(), Some(&report));
    }

    #[test]
    fn test_cache_error_from_source() {
        let err: CacheError = SourceError::Unavailable("down".into()).into();
        assert_eq!(err.to_string(), "activity sync failed: Record source unavailable: down");
    }
}
