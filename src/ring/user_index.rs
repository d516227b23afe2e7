// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-user slot lists.
//!
//! Rebuilt wholesale after every insert rather than patched: lists are
//! truncated (keeping their allocations) and refilled by one walk of the
//! live ring.

use std::collections::HashMap;

/// Map of user ID to the ring slots that reference it, newest first.
#[derive(Debug)]
pub struct UserIndex {
    lists: HashMap<String, Vec<usize>>,
    /// Initial allocation for a user's list
    base_capacity: usize,
    /// Optional cap; entries past it are dropped
    limit: Option<usize>,
}

impl UserIndex {
    pub fn new(base_capacity: usize, limit: Option<usize>) -> Self {
        Self {
            lists: HashMap::new(),
            base_capacity,
            limit,
        }
    }

    /// Empty every list without freeing it.
    pub(crate) fn truncate_all(&mut self) {
        for list in self.lists.values_mut() {
            list.clear();
        }
    }

    /// Forget users left with no slots after a rebuild. Lists that grew
    /// past the base allocation are kept for reuse.
    pub(crate) fn prune_empty(&mut self) {
        let base = self.base_capacity;
        self.lists.retain(|_, list| !list.is_empty() || list.capacity() > base);
    }

    /// Append `slot` to `user`'s list, unless the list is at its cap.
    pub(crate) fn push(&mut self, user: &str, slot: usize) {
        if let Some(list) = self.lists.get_mut(user) {
            if self.limit.map_or(true, |limit| list.len() < limit) {
                list.push(slot);
            }
            return;
        }
        if self.limit == Some(0) {
            return;
        }
        let mut list = Vec::with_capacity(self.base_capacity);
        list.push(slot);
        self.lists.insert(user.to_string(), list);
    }

    /// Slots referencing `user`. Empty if the user has no live records.
    #[must_use]
    pub fn slots(&self, user: &str) -> &[usize] {
        self.lists.get(user).map_or(&[], Vec::as_slice)
    }

    /// Number of users with at least one live record.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.lists.values().filter(|l| !l.is_empty()).count()
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.lists.iter().map(|(u, l)| (u.as_str(), l.as_slice()))
    }
}
