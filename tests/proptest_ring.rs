//! Property-based tests for the ring store and the sync merge.
//!
//! Random capacities and batch sequences are checked against a plain
//! `Vec` model of "the newest `capacity` records, newest first".
//!
//! Run with: `cargo test --test proptest_ring`

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use proptest::prelude::*;

use activity_cache::{
    ActivityCache, ActivityCacheConfig, ActivityRecord, FetchRequest, RecordSource, RingStore,
    SourceError, UserIndex,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

const USERS: [Option<&str>; 5] = [Some("alice"), Some("bob"), Some("carol"), Some(""), None];

/// Batch sizes plus a user pick per record.
fn batches_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0..USERS.len(), 0..40), 1..30)
}

/// Turn user picks into newest-first batches with increasing IDs.
fn build_batches(picks: &[Vec<usize>]) -> Vec<Vec<ActivityRecord>> {
    let mut next_id = 0i64;
    picks
        .iter()
        .map(|batch| {
            let mut records: Vec<ActivityRecord> = batch
                .iter()
                .map(|&pick| {
                    let mut record = ActivityRecord::new(next_id, next_id);
                    if let Some(user) = USERS[pick] {
                        record = record.with_user(user);
                    }
                    next_id += 1;
                    record
                })
                .collect();
            records.reverse();
            records
        })
        .collect()
}

fn ids(records: impl Iterator<Item = ActivityRecord>) -> Vec<i64> {
    records.map(|r| r.id).collect()
}

// =============================================================================
// Ring Store Properties
// =============================================================================

proptest! {
    /// After any insert sequence the ring holds exactly the newest
    /// `capacity` records, newest first, with consistent indexes.
    #[test]
    fn ring_matches_newest_first_model(capacity in 1usize..32, picks in batches_strategy()) {
        let mut ring = RingStore::new(capacity);
        let mut model: Vec<ActivityRecord> = Vec::new();

        for batch in build_batches(&picks) {
            let report = ring.insert(&batch);
            prop_assert_eq!(report.written, batch.len().min(capacity));

            let mut next: Vec<ActivityRecord> = batch.iter().take(capacity).cloned().collect();
            next.extend(model.drain(..));
            next.truncate(capacity);
            model = next;

            ring.debug_validate_invariants();
            prop_assert!(ring.total() <= capacity);
            prop_assert_eq!(ids(ring.iter().cloned()), ids(model.iter().cloned()));
        }

        for record in &model {
            prop_assert_eq!(ring.get_by_id(record.id), Some(record));
        }
    }

    /// Every user query equals filtering the live records by that user.
    #[test]
    fn user_lookup_matches_filter(capacity in 1usize..24, picks in batches_strategy()) {
        let mut ring = RingStore::new(capacity);
        for batch in build_batches(&picks) {
            ring.insert(&batch);

            for user in ["alice", "bob", "carol", ""] {
                let expected: Vec<i64> = ring
                    .iter()
                    .filter(|r| r.user() == Some(user))
                    .map(|r| r.id)
                    .collect();
                prop_assert_eq!(ids(ring.records_for_user(user).cloned()), expected);
            }
        }
    }

    /// A per-user cap keeps only that user's newest records.
    #[test]
    fn user_limit_keeps_newest(
        capacity in 1usize..24,
        limit in 0usize..6,
        picks in batches_strategy(),
    ) {
        let mut ring = RingStore::with_user_index(capacity, UserIndex::new(4, Some(limit)));
        for batch in build_batches(&picks) {
            ring.insert(&batch);
            ring.debug_validate_invariants();

            for user in ["alice", "bob", "carol"] {
                let expected: Vec<i64> = ring
                    .iter()
                    .filter(|r| r.user() == Some(user))
                    .take(limit)
                    .map(|r| r.id)
                    .collect();
                prop_assert_eq!(ids(ring.records_for_user(user).cloned()), expected);
            }
        }
    }
}

// =============================================================================
// Sync Merge Properties
// =============================================================================

/// Replays queued batches verbatim.
#[derive(Default)]
struct ReplaySource {
    batches: Mutex<VecDeque<Vec<ActivityRecord>>>,
}

#[async_trait]
impl RecordSource for ReplaySource {
    async fn fetch(&self, _request: FetchRequest) -> Result<Vec<ActivityRecord>, SourceError> {
        Ok(self.batches.lock().pop_front().unwrap_or_default())
    }
}

proptest! {
    /// Resending already-cached records (the overlap a since-cursor produces)
    /// never duplicates or reorders anything.
    #[test]
    fn resent_records_are_dropped(
        capacity in 1usize..20,
        rounds in prop::collection::vec((0usize..12, 0usize..8), 1..20),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let source = Arc::new(ReplaySource::default());
        let config = ActivityCacheConfig {
            capacity,
            require_user_id: false,
            ..Default::default()
        };
        let cache = ActivityCache::new(source.clone(), config).unwrap();

        let mut next_id = 0i64;
        let mut model: Vec<i64> = Vec::new();

        for (fresh, resent) in rounds {
            // New records first, then the newest already-cached ones
            let mut batch: Vec<ActivityRecord> = (0..fresh)
                .map(|i| {
                    let id = next_id + (fresh - 1 - i) as i64;
                    ActivityRecord::new(id, id)
                })
                .collect();
            next_id += fresh as i64;
            batch.extend(model.iter().take(resent).map(|&id| ActivityRecord::new(id, id)));
            batch.truncate(capacity);

            let new_ids: Vec<i64> = batch
                .iter()
                .map(|r| r.id)
                .take_while(|id| !model.contains(id))
                .collect();
            let expected_dupes = batch.len() - new_ids.len();
            let mut next = new_ids;
            next.extend(model.drain(..));
            next.truncate(capacity);
            model = next;

            source.batches.lock().push_back(batch);
            cache.invalidate();
            runtime.block_on(cache.maybe_sync()).unwrap();

            prop_assert_eq!(cache.stats().dupes_in_last_sync, expected_dupes);
            let live = cache.inspect(|ring| {
                ring.debug_validate_invariants();
                ring.iter().map(|r| r.id).collect::<Vec<_>>()
            });
            prop_assert_eq!(&live, &model);
        }
    }
}
