// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Fixed-capacity ring of activity records with identity and user indexes.
//!
//! # Layout
//!
//! ```text
//!   slots:  [ 21 | 20 | 19 | -- | -- | 25 | 24 | 23 | 22 ]
//!                          ▲              ▲
//!                         end           start
//!
//!   live span: start → end, walking (i + 1) % capacity
//!   newest record at `start`, oldest at `end`
//! ```
//!
//! A batch (newest first) is written into the slots immediately *before*
//! `start`, so `start` moves backwards by the batch length. Free slots are
//! consumed first; once they run out the batch overwrites the oldest live
//! records and `end` retracts to keep the span at `capacity`.
//!
//! The identity index (`id → slot`) is patched on every write. The
//! [`UserIndex`] is rebuilt after every non-empty insert.

mod user_index;

pub use user_index::UserIndex;

use std::collections::HashMap;

use crate::record::ActivityRecord;

/// What an [`RingStore::insert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertReport {
    /// Records written
    pub written: usize,
    /// Live records overwritten to make room
    pub evicted: usize,
}

/// Bounded newest-first store of activity records.
///
/// # Example
///
/// ```
/// use activity_cache::{ActivityRecord, RingStore};
///
/// let mut ring = RingStore::new(3);
/// ring.insert(&[ActivityRecord::new(1, 0), ActivityRecord::new(0, 0)]);
/// ring.insert(&[ActivityRecord::new(3, 0), ActivityRecord::new(2, 0)]);
///
/// let ids: Vec<i64> = ring.iter().map(|r| r.id).collect();
/// assert_eq!(ids, vec![3, 2, 1]);
/// assert!(ring.get_by_id(0).is_none());
/// ```
#[derive(Debug)]
pub struct RingStore {
    slots: Box<[Option<ActivityRecord>]>,
    start: Option<usize>,
    end: Option<usize>,
    total: usize,
    by_id: HashMap<i64, usize>,
    by_user: UserIndex,
}

impl RingStore {
    /// Create an empty ring. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_user_index(capacity, UserIndex::new(0, None))
    }

    /// Create an empty ring around a preconfigured [`UserIndex`], for a
    /// per-user list allocation or cap. A capacity of zero is bumped to one.
    pub fn with_user_index(capacity: usize, by_user: UserIndex) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            start: None,
            end: None,
            total: 0,
            by_id: HashMap::with_capacity(capacity),
            by_user,
        }
    }

    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live records.
    #[must_use]
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Slot holding the newest record.
    #[must_use]
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    /// Slot holding the oldest live record.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        self.end
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&ActivityRecord> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn contains_id(&self, id: i64) -> bool {
        self.by_id.contains_key(&id)
    }

    #[must_use]
    pub fn get_by_id(&self, id: i64) -> Option<&ActivityRecord> {
        self.by_id.get(&id).and_then(|&slot| self.slot(slot))
    }

    /// Live slot indexes, newest first.
    pub fn slot_order(&self) -> SlotOrder {
        SlotOrder {
            next: self.start,
            end: self.end,
            capacity: self.capacity(),
        }
    }

    /// Live records, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActivityRecord> + '_ {
        self.slot_order().filter_map(move |slot| self.slot(slot))
    }

    /// Live records referencing `user`, in ring order.
    pub fn records_for_user<'a>(&'a self, user: &str) -> impl Iterator<Item = &'a ActivityRecord> + 'a {
        self.by_user
            .slots(user)
            .iter()
            .filter_map(move |&slot| self.slot(slot))
    }

    #[must_use]
    pub fn user_index(&self) -> &UserIndex {
        &self.by_user
    }

    /// Write a newest-first batch ahead of the current head.
    ///
    /// Only the first `capacity` records of an oversized batch are kept.
    /// The user index is rebuilt whenever at least one slot was written.
    pub fn insert(&mut self, batch: &[ActivityRecord]) -> InsertReport {
        let capacity = self.capacity();
        let batch = &batch[..batch.len().min(capacity)];
        let n = batch.len();
        if n == 0 {
            return InsertReport::default();
        }

        let new_start = match self.start {
            None => 0,
            Some(start) => (start + capacity - n) % capacity,
        };

        let mut report = InsertReport { written: n, evicted: 0 };
        for (offset, record) in batch.iter().enumerate() {
            let slot = (new_start + offset) % capacity;
            if let Some(old) = self.slots[slot].take() {
                if self.by_id.get(&old.id) == Some(&slot) {
                    self.by_id.remove(&old.id);
                }
                report.evicted += 1;
            } else {
                self.total += 1;
            }
            self.by_id.insert(record.id, slot);
            self.slots[slot] = Some(record.clone());
        }

        self.start = Some(new_start);
        self.end = Some((new_start + self.total - 1) % capacity);
        self.rebuild_user_index();
        report
    }

    /// Refill the user index: the freshly written slots come first in the
    /// walk, followed by the surviving older slots through to `end`.
    fn rebuild_user_index(&mut self) {
        self.by_user.truncate_all();
        let order = self.slot_order();
        for slot in order {
            if let Some(user) = self.slots[slot].as_ref().and_then(ActivityRecord::user) {
                self.by_user.push(user, slot);
            }
        }
        self.by_user.prune_empty();
    }

    /// Two-line dump of slot indexes and the IDs they hold.
    #[must_use]
    pub fn layout(&self) -> String {
        let width = (self.capacity() - 1).to_string().len();
        let mut indexes = String::with_capacity(self.capacity() * (width + 1));
        let mut ids = String::with_capacity(self.capacity() * (width + 1));
        for (i, slot) in self.slots.iter().enumerate() {
            indexes.push_str(&format!("{:0width$}|", i, width = width));
            match slot {
                Some(record) => ids.push_str(&format!("{:0width$}|", record.id, width = width)),
                None => ids.push_str(&format!("{:>width$}|", "-", width = width)),
            }
        }
        format!("{indexes}\n{ids}")
    }

    /// Panic if any structural invariant is broken. O(capacity); meant for tests.
    pub fn debug_validate_invariants(&self) {
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(self.total, occupied, "total does not match occupied slots");
        assert!(self.total <= self.capacity());

        match (self.start, self.end) {
            (None, None) => assert_eq!(self.total, 0, "empty cursors on a non-empty ring"),
            (Some(_), Some(_)) => {}
            other => panic!("half-set cursors: {other:?}"),
        }

        let walked: Vec<usize> = self.slot_order().collect();
        assert_eq!(walked.len(), self.total, "live span length != total\n{}", self.layout());
        for &slot in &walked {
            assert!(self.slots[slot].is_some(), "empty slot {slot} inside live span");
        }

        assert_eq!(self.by_id.len(), self.total, "identity index size != total");
        for &slot in &walked {
            let Some(record) = self.slots[slot].as_ref() else { continue };
            assert_eq!(self.by_id.get(&record.id), Some(&slot), "identity index stale for {}", record.id);
        }

        let mut expected: HashMap<&str, Vec<usize>> = HashMap::new();
        for &slot in &walked {
            if let Some(user) = self.slots[slot].as_ref().and_then(ActivityRecord::user) {
                expected.entry(user).or_default().push(slot);
            }
        }
        for (user, slots) in self.by_user.iter() {
            let want = expected.get(user).map_or(&[][..], Vec::as_slice);
            let want = &want[..want.len().min(self.by_user.limit().unwrap_or(usize::MAX))];
            assert_eq!(slots, want, "user index mismatch for {user}");
        }
        if self.by_user.limit() != Some(0) {
            for user in expected.keys() {
                assert!(!self.by_user.slots(user).is_empty(), "user {user} missing from index");
            }
        }
    }
}

/// Iterator over live slot indexes from `start` to `end`.
#[derive(Debug, Clone)]
pub struct SlotOrder {
    next: Option<usize>,
    end: Option<usize>,
    capacity: usize,
}

impl Iterator for SlotOrder {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = if Some(current) == self.end {
            None
        } else {
            Some((current + 1) % self.capacity)
        };
        Some(current)
    }
}
