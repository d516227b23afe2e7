// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::ActivityRecord;

/// Failure reported by a [`RecordSource`].
///
/// `Clone` so a single failed fetch can be handed to every caller that was
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Record source unavailable: {0}")]
    Unavailable(String),
    #[error("Record source backend error: {0}")]
    Backend(String),
    #[error("Malformed response from record source: {0}")]
    Malformed(String),
}

/// Parameters of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    /// Maximum number of records to return
    pub limit: usize,
    /// Only records dated strictly after this (epoch millis). `None` = no lower bound.
    pub since: Option<i64>,
    /// Hint that only records referencing a user are wanted
    pub require_user_id: bool,
}

/// Anything that can hand out the most recent activity records.
///
/// Contract:
/// - returns at most `limit` records, newest first
/// - every record is dated strictly after `since` when it is set
/// - may resend records already returned by an earlier call
/// - must not skip records inside the requested window that were never sent
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<Vec<ActivityRecord>, SourceError>;
}

#[async_trait]
impl<S: RecordSource + ?Sized> RecordSource for std::sync::Arc<S> {
    async fn fetch(&self, request: FetchRequest) -> Result<Vec<ActivityRecord>, SourceError> {
        (**self).fetch(request).await
    }
}
