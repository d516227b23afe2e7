// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::record::{now_millis, ActivityRecord};
use super::traits::{FetchRequest, RecordSource, SourceError};

/// In-process activity log.
///
/// Records are kept in the order they were pushed (oldest first) and served
/// newest first, honouring `since`, `limit` and the user filter.
pub struct MemorySource {
    log: RwLock<Vec<ActivityRecord>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: RwLock::new(Vec::new()),
        }
    }

    /// Append a record as the newest entry.
    pub fn push(&self, record: ActivityRecord) {
        self.log.write().push(record);
    }

    /// Append a record with the next sequential ID, stamped with the current time.
    pub fn push_now(&self, user_id: Option<&str>) -> ActivityRecord {
        let mut log = self.log.write();
        let id = log.last().map_or(0, |r| r.id + 1);
        let mut record = ActivityRecord::new(id, now_millis());
        record.user_id = user_id.map(str::to_string);
        log.push(record.clone());
        record
    }

    /// Get current record count
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.read().is_empty()
    }

    /// Clear all records
    pub fn clear(&self) {
        self.log.write().clear();
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch(&self, request: FetchRequest) -> Result<Vec<ActivityRecord>, SourceError> {
        let log = self.log.read();
        Ok(log
            .iter()
            .rev()
            .filter(|r| request.since.map_or(true, |since| r.date > since))
            .filter(|r| !request.require_user_id || r.user().is_some())
            .take(request.limit)
            .cloned()
            .collect())
    }
}
