//! # Worker Journey Tests
//!
//! The batch worker sweeps source tables for memories not yet in a box:
//!
//! 1. New memories are boxed oldest first and counted by decision
//! 2. A second run finds nothing left to do
//! 3. The time window and type filter bound what is fetched
//! 4. Dry runs change nothing
//! 5. A failing memory is counted and the rest of the run continues

use std::sync::Arc;

use chrono::{Duration, Utc};
use membox_core::{run_worker, BoxStore, MemboxBuilder, MemoryType, WorkerConfig};
use membox_e2e_tests::{FlakyStore, TestDataFactory, TestDatabaseManager};

fn minutes_ago(minutes: i64) -> chrono::DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}

// ============================================================================
// NORMAL RUNS
// ============================================================================

/// A sweep boxes every pending memory, then has nothing left
#[test]
fn test_worker_boxes_pending_memories_once() {
    let db = TestDatabaseManager::new_temp();
    db.seed_memories(
        MemoryType::DebuggingFact,
        &[
            ("rust cache miss: warm the cache on startup", minutes_ago(40)),
            ("rust cache stale: shorten the ttl", minutes_ago(20)),
        ],
    );
    db.seed_memory(
        MemoryType::ClaudeMemory,
        "git branch cleanup after the release",
        minutes_ago(30),
    );

    let mut builder = db.builder();
    let stats = run_worker(&mut builder, &WorkerConfig::default()).unwrap();

    assert_eq!(stats.found, 3);
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.boxes_created, 2);
    assert_eq!(stats.boxes_updated, 1);
    assert_eq!(stats.errors, 0);
    assert_eq!(db.box_count(), 2);

    let again = run_worker(&mut builder, &WorkerConfig::default()).unwrap();
    assert_eq!(again.found, 0);
    assert_eq!(again.processed, 0);
}

/// Box contents come back joined with the source text
#[test]
fn test_worker_boxes_read_back_with_content() {
    let db = TestDatabaseManager::new_temp();
    let texts = TestDataFactory::topic_thread(&["sql", "database", "performance"], 3);
    let times = TestDataFactory::timeline(3, Duration::minutes(5), Duration::minutes(1));
    for (text, at) in texts.iter().zip(&times) {
        db.seed_memory(MemoryType::ClaudeMemory, text, *at);
    }

    let mut builder = db.builder();
    let stats = run_worker(&mut builder, &WorkerConfig::default()).unwrap();
    assert_eq!(stats.boxes_created, 1);
    assert_eq!(stats.boxes_updated, 2);

    let boxes = db.storage.search_boxes("database", 0.0, 10).unwrap();
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].start_time, times[0]);
    assert_eq!(boxes[0].end_time, times[2]);

    let memories = db.storage.get_box_memories(boxes[0].id).unwrap();
    let contents: Vec<&str> = memories.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, texts.iter().map(String::as_str).collect::<Vec<_>>());
}

// ============================================================================
// FILTERS
// ============================================================================

/// Memories outside the window or of other types are left alone
#[test]
fn test_worker_respects_window_and_types() {
    let db = TestDatabaseManager::new_temp();
    db.seed_memory(MemoryType::ClaudeMemory, "recent api note", minutes_ago(10));
    db.seed_memory(MemoryType::ClaudeMemory, "old api note", minutes_ago(180));
    db.seed_memory(MemoryType::Narrative, "session narrative about the api", minutes_ago(5));

    let mut builder = db.builder();
    let stats = run_worker(&mut builder, &WorkerConfig::default()).unwrap();
    assert_eq!(stats.found, 1);

    let wide = WorkerConfig {
        since: Duration::hours(4),
        memory_types: vec![MemoryType::ClaudeMemory, MemoryType::Narrative],
        ..Default::default()
    };
    let stats = run_worker(&mut builder, &wide).unwrap();
    assert_eq!(stats.found, 2);
    assert_eq!(stats.processed, 2);
}

/// The per-type limit caps the fetch
#[test]
fn test_worker_limit_per_type() {
    let db = TestDatabaseManager::new_temp();
    for i in 0..5 {
        db.seed_memory(
            MemoryType::ClaudeMemory,
            &format!("note {i} about search"),
            minutes_ago(i + 1),
        );
    }

    let config = WorkerConfig {
        limit: 2,
        ..Default::default()
    };
    let mut builder = db.builder();
    let stats = run_worker(&mut builder, &config).unwrap();
    assert_eq!(stats.found, 2);
    assert_eq!(stats.processed, 2);

    let rest = run_worker(&mut builder, &WorkerConfig::default()).unwrap();
    assert_eq!(rest.found, 3);
}

/// Dry runs report what they found and write nothing
#[test]
fn test_worker_dry_run_changes_nothing() {
    let db = TestDatabaseManager::new_temp();
    for i in 0..12 {
        db.seed_memory(
            MemoryType::ClaudeMemory,
            &format!("dry run memory {i} about async thread pools"),
            minutes_ago(i + 1),
        );
    }

    let config = WorkerConfig {
        dry_run: true,
        ..Default::default()
    };
    let mut builder = db.builder();
    let stats = run_worker(&mut builder, &config).unwrap();

    assert_eq!(stats.found, 12);
    assert_eq!(stats.processed, 0);
    assert_eq!(db.box_count(), 0);
}

// ============================================================================
// FAILURES
// ============================================================================

/// One failing memory does not stop the others, and stays pending
#[test]
fn test_worker_counts_failures_and_continues() {
    let db = TestDatabaseManager::new_temp();
    db.seed_memory(MemoryType::ClaudeMemory, "python api timeout", minutes_ago(30));
    db.seed_memory(
        MemoryType::ClaudeMemory,
        "poison record\nrust build broke",
        minutes_ago(20),
    );
    db.seed_memory(MemoryType::ClaudeMemory, "git merge conflict", minutes_ago(10));

    let store = Arc::new(FlakyStore::new(db.storage.clone()));
    let mut flaky = MemboxBuilder::new(store);
    let stats = run_worker(&mut flaky, &WorkerConfig::default()).unwrap();

    assert_eq!(stats.found, 3);
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(db.box_count(), 2);

    let mut healthy = db.builder();
    let retry = run_worker(&mut healthy, &WorkerConfig::default()).unwrap();
    assert_eq!(retry.found, 1);
    assert_eq!(retry.boxes_created, 1);
    assert_eq!(retry.errors, 0);
}
