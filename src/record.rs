// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Activity record data structure.
//!
//! An [`ActivityRecord`] is one entry of the upstream activity log. The cache
//! only looks at `id`, `user_id` and `date`; everything else is payload that
//! is carried through untouched.

use serde::{Deserialize, Serialize};

/// One activity log entry as delivered by a [`RecordSource`](crate::source::RecordSource).
///
/// # Example
///
/// ```
/// use activity_cache::ActivityRecord;
///
/// let record = ActivityRecord::new(42, 1_700_000_000_000)
///     .with_user("user-a")
///     .with_name("User user-a logged in");
///
/// assert_eq!(record.id, 42);
/// assert_eq!(record.user(), Some("user-a"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Upstream-assigned identity. Unique per record.
    pub id: i64,
    /// User the record references, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// When the activity happened (epoch millis)
    pub date: i64,
    /// Human readable summary
    #[serde(default)]
    pub name: String,
    /// Upstream event type (e.g. `SessionStarted`)
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Upstream log level, e.g. `Information`
    #[serde(default)]
    pub severity: String,
}

impl ActivityRecord {
    /// Create a record with no user reference and empty payload.
    pub fn new(id: i64, date: i64) -> Self {
        Self {
            id,
            user_id: None,
            date,
            name: String::new(),
            kind: String::new(),
            short_overview: None,
            overview: None,
            item_id: None,
            severity: String::new(),
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// The referenced user, treating an empty string the same as no user.
    #[must_use]
    #[inline]
    pub fn user(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|u| !u.is_empty())
    }
}

/// Current wall-clock time in epoch millis.
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_user_is_no_user() {
        let record = ActivityRecord::new(1, 0).with_user("");
        assert_eq!(record.user(), None);

        let record = ActivityRecord::new(1, 0);
        assert_eq!(record.user(), None);
    }

    #[test]
    fn test_builder() {
        let record = ActivityRecord::new(7, 123)
            .with_user("u1")
            .with_name("Playback started")
            .with_kind("VideoPlayback");

        assert_eq!(record.user(), Some("u1"));
        assert_eq!(record.name, "Playback started");
        assert_eq!(record.kind, "VideoPlayback");
        assert_eq!(record.date, 123);
    }

    #[test]
    fn test_deserialize_with_missing_payload() {
        let record: ActivityRecord =
            serde_json::from_value(json!({"id": 5, "date": 1000})).unwrap();
        assert_eq!(record, ActivityRecord::new(5, 1000));
    }

    #[test]
    fn test_serialize_skips_absent_optionals() {
        let value = serde_json::to_value(ActivityRecord::new(5, 1000)).unwrap();
        assert!(value.get("user_id").is_none());
        assert!(value.get("overview").is_none());
        assert_eq!(value["id"], 5);
    }

    #[test]
    fn test_now_millis_is_positive() {
        assert!(now_millis() > 0);
    }
}
