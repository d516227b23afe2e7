// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic activity-cache usage example.
//!
//! Demonstrates:
//! 1. Filling an in-memory activity source
//! 2. Lazy sync on first read
//! 3. Lookups by entry ID and by user
//! 4. Eviction once the ring is full
//! 5. Concurrent readers sharing a single fetch
//! 6. Displaying stats and raw metrics
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=activity_cache=debug cargo run --example basic_usage
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use activity_cache::{ActivityCache, ActivityCacheConfig, MemorySource};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use tracing_subscriber::EnvFilter;

const USERS: [&str; 3] = ["alice", "bob", "carol"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           activity-cache: Basic Usage Example                 ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Source and cache
    // ─────────────────────────────────────────────────────────────────────────
    let source = Arc::new(MemorySource::new());
    for i in 0..12 {
        source.push_now(Some(USERS[i % USERS.len()]));
    }
    println!("📦 Source holds {} records", source.len());

    let config = ActivityCacheConfig {
        capacity: 16,
        wait_for_sync_timeout_ms: 200,
        ..Default::default()
    };
    config.validate()?;
    let cache = Arc::new(ActivityCache::new(source.clone(), config)?);
    println!("   Cache: {:?}", cache);

    // ─────────────────────────────────────────────────────────────────────────
    // 2-3. First read syncs; later reads hit the ring
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔍 Lookups (first one pulls from the source)...");
    for id in [0, 11, 99] {
        let start = Instant::now();
        let found = cache.by_entry_id(id).await?;
        println!("   └─ by_entry_id({id}) → {:?} ({:?})", found.map(|r| r.user_id), start.elapsed());
    }
    for user in USERS {
        let ids: Vec<i64> = cache.by_user_id(user).await?.iter().map(|r| r.id).collect();
        println!("   └─ by_user_id({user}) → {ids:?}");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Overflow the ring
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n♻️  Pushing 10 more records into a ring of 16...");
    for i in 0..10 {
        source.push_now(Some(USERS[i % USERS.len()]));
    }
    cache.invalidate();
    let outcome = cache.maybe_sync().await?;
    println!("   └─ {outcome}");
    println!("   └─ oldest cached is now {:?}", cache.recent(usize::MAX).await?.last().map(|r| r.id));
    println!("{}", cache.inspect(|ring| ring.layout()));

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Concurrent readers after the window lapses
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n👥 8 concurrent readers on a stale cache...");
    source.push_now(Some("dave"));
    tokio::time::sleep(Duration::from_millis(250)).await;
    let fetches_before = cache.stats().fetches;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move { cache.by_user_id("dave").await }));
    }
    for handle in handles {
        handle.await??;
    }
    println!("   └─ upstream fetches: {}", cache.stats().fetches - fetches_before);

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Stats and metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📊 Cache stats:");
    println!("   {:#?}", cache.stats());

    println!("\n📈 Raw Metrics:");
    dump_metrics(&snapshotter);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}

/// Print every captured metric, grouped by kind.
fn dump_metrics(snapshotter: &Snapshotter) {
    let mut counters = Vec::new();
    let mut gauges = Vec::new();
    let mut histograms = Vec::new();

    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let name = if labels.is_empty() {
            key.name().to_string()
        } else {
            format!("{}{{{}}}", key.name(), labels.join(","))
        };

        match value {
            DebugValue::Counter(v) => counters.push((name, v)),
            DebugValue::Gauge(v) => gauges.push((name, v.into_inner())),
            DebugValue::Histogram(samples) => {
                let count = samples.len();
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                let max = samples.iter().map(|v| v.into_inner()).fold(0.0, f64::max);
                histograms.push((name, count, sum, max));
            }
        }
    }

    counters.sort();
    gauges.sort_by(|a, b| a.0.cmp(&b.0));
    histograms.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, value) in &counters {
        println!("   counter   {name} = {value}");
    }
    for (name, value) in &gauges {
        println!("   gauge     {name} = {value:.2}");
    }
    for (name, count, sum, max) in &histograms {
        println!("   histogram {name} count={count} sum={sum:.4} max={max:.4}");
    }
    if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
        println!("   (no metrics recorded)");
    }
}
