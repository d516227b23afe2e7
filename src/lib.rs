// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Activity Cache
//!
//! A bounded, in-process mirror of a remote, paginated activity log.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Query Surface                         │
//! │  • by_entry_id() / by_user_id() / recent()                  │
//! │  • Returns owned copies                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ maybe_sync()
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Sync Engine                          │
//! │  • Freshness window, lazily pulled by readers               │
//! │  • Single-flight: one fetch, every waiter shares the result │
//! │  • Drops resent records (first already-cached ID onwards)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ merge
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Ring Store                           │
//! │  • Fixed capacity, newest first, oldest evicted             │
//! │  • Identity index (id → slot), patched per write            │
//! │  • User index (user → slots), rebuilt per merge             │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//!                              │ fetch(limit, since, require_user_id)
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   RecordSource (upstream)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use activity_cache::{ActivityCache, ActivityCacheConfig, ActivityRecord, MemorySource};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), activity_cache::CacheError> {
//! let source = Arc::new(MemorySource::new());
//! source.push(ActivityRecord::new(1, 1_700_000_000_000).with_user("alice"));
//! source.push(ActivityRecord::new(2, 1_700_000_001_000).with_user("bob"));
//!
//! let config = ActivityCacheConfig {
//!     capacity: 1000,
//!     wait_for_sync_timeout_ms: 500,
//!     ..Default::default()
//! };
//! let cache = ActivityCache::new(source, config)?;
//!
//! assert!(cache.by_entry_id(2).await?.is_some());
//! assert_eq!(cache.by_user_id("alice").await?.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`coordinator`]: [`ActivityCache`], freshness and single-flight sync
//! - [`ring`]: [`RingStore`] and its indexes
//! - [`source`]: the [`RecordSource`] boundary and [`MemorySource`]
//! - [`resilience`]: fetch retry
//! - [`metrics`]: `metrics` crate instrumentation

pub mod config;
pub mod record;
pub mod source;
pub mod ring;
pub mod resilience;
pub mod coordinator;
pub mod metrics;

pub use config::ActivityCacheConfig;
pub use record::ActivityRecord;
pub use source::{FetchRequest, MemorySource, RecordSource, SourceError};
pub use ring::{InsertReport, RingStore, UserIndex};
pub use coordinator::{ActivityCache, CacheError, CacheStats, SyncOutcome, SyncReport};
pub use resilience::retry::RetryConfig;
pub use metrics::LatencyTimer;
