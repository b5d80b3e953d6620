//! # Continuation Journey Tests
//!
//! Memories arriving one at a time either continue a recent box or open a
//! new one:
//!
//! 1. Embedding similarity continues a box even without shared keywords
//! 2. Keyword overlap is the fallback when no embedder is attached
//! 3. Unrelated topics open separate boxes
//! 4. A fresh builder on the same database picks up where the last one left off

use std::sync::Arc;

use chrono::{Duration, Utc};
use membox_core::{BoxDecision, BoxStore, MemoryType};
use membox_e2e_tests::mocks::POOL_TIMEOUT_PAIR;
use membox_e2e_tests::{TestDataFactory, TestDatabaseManager, TokenEmbedder};
use uuid::Uuid;

// ============================================================================
// EMBEDDING CONTINUATION
// ============================================================================

/// Two timeout fixes land in one box through embedding similarity
#[test]
fn test_pool_timeout_fixes_share_a_box() {
    let db = TestDatabaseManager::new_temp();
    let mut builder = db.builder_with_embedder(Arc::new(TokenEmbedder::new()));

    let first = builder
        .add_memory(
            MemoryType::DebuggingFact,
            Uuid::new_v4(),
            POOL_TIMEOUT_PAIR[0],
            None,
        )
        .unwrap();
    assert_eq!(first.decision, BoxDecision::Created);
    assert_eq!(first.memory_box.memory_count, 1);
    assert_eq!(first.memory_box.keywords, vec!["database".to_string()]);

    let second = builder
        .add_memory(
            MemoryType::ClaudeMemory,
            Uuid::new_v4(),
            POOL_TIMEOUT_PAIR[1],
            None,
        )
        .unwrap();
    assert!(second.is_continuation());
    assert_eq!(second.memory_box.id, first.memory_box.id);
    assert_eq!(second.memory_box.memory_count, 2);
    assert!(second
        .memory_box
        .events
        .contains(&"the database timeout by increasing pool size".to_string()));
    assert!(second
        .memory_box
        .events
        .contains(&"another timeout in the connection pool".to_string()));

    assert_eq!(db.box_count(), 1);

    let items = db.storage.get_box_items(first.memory_box.id).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].memory_type, MemoryType::DebuggingFact);
    assert_eq!(items[1].memory_type, MemoryType::ClaudeMemory);
    assert!(items[0].position < items[1].position);
}

/// The same pair without embeddings has no keyword overlap to go on
#[test]
fn test_pool_timeout_fixes_split_without_embeddings() {
    let db = TestDatabaseManager::new_temp();
    let mut builder = db.builder();

    let first = builder
        .add_memory(
            MemoryType::DebuggingFact,
            Uuid::new_v4(),
            POOL_TIMEOUT_PAIR[0],
            None,
        )
        .unwrap();
    let second = builder
        .add_memory(
            MemoryType::ClaudeMemory,
            Uuid::new_v4(),
            POOL_TIMEOUT_PAIR[1],
            None,
        )
        .unwrap();

    assert_eq!(second.decision, BoxDecision::Created);
    assert_ne!(first.memory_box.id, second.memory_box.id);
    assert_eq!(db.box_count(), 2);
}

// ============================================================================
// KEYWORD CONTINUATION
// ============================================================================

/// A thread of memories on the same keywords grows one box
#[test]
fn test_keyword_thread_grows_one_box() {
    let db = TestDatabaseManager::new_temp();
    let mut builder = db.builder();
    let thread = TestDataFactory::topic_thread(&["rust", "cache", "performance"], 4);
    let times = TestDataFactory::timeline(4, Duration::minutes(2), Duration::minutes(1));

    let mut box_ids = Vec::new();
    for (text, at) in thread.iter().zip(&times) {
        let result = builder
            .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), text, Some(*at))
            .unwrap();
        box_ids.push(result.memory_box.id);
    }

    assert!(box_ids.iter().all(|id| *id == box_ids[0]));
    assert_eq!(db.box_count(), 1);

    let memory_box = db.storage.get_box(box_ids[0]).unwrap().unwrap();
    assert_eq!(memory_box.memory_count, 4);
    assert_eq!(memory_box.start_time, times[0]);
    assert_eq!(memory_box.end_time, times[3]);
    assert!(memory_box.score > 10.0);
}

/// Unrelated keyword sets open separate boxes
#[test]
fn test_unrelated_topics_open_separate_boxes() {
    let db = TestDatabaseManager::new_temp();
    let mut builder = db.builder();

    let rust = builder
        .add_memory(
            MemoryType::ClaudeMemory,
            Uuid::new_v4(),
            "rust cache performance tuning",
            None,
        )
        .unwrap();
    let git = builder
        .add_memory(
            MemoryType::ClaudeMemory,
            Uuid::new_v4(),
            "git commit branch cleanup",
            None,
        )
        .unwrap();
    let rust_again = builder
        .add_memory(
            MemoryType::ClaudeMemory,
            Uuid::new_v4(),
            "more rust cache performance",
            None,
        )
        .unwrap();

    assert_ne!(rust.memory_box.id, git.memory_box.id);
    assert_eq!(rust_again.memory_box.id, rust.memory_box.id);
    assert_eq!(rust_again.decision, BoxDecision::Merged);
    assert_eq!(db.box_count(), 2);
}

// ============================================================================
// RESTART
// ============================================================================

/// A new builder seeds its window from recently updated boxes
#[test]
fn test_new_builder_continues_existing_box() {
    let db = TestDatabaseManager::new_temp();

    let first = {
        let mut builder = db.builder();
        builder
            .add_memory(
                MemoryType::DebuggingFact,
                Uuid::new_v4(),
                "sql database error: retry on busy",
                None,
            )
            .unwrap()
    };

    let reopened = db.reopen();
    let mut builder = membox_core::MemboxBuilder::new(reopened.clone());
    assert_eq!(builder.loom().len(), 1);

    let next = builder
        .add_memory(
            MemoryType::DebuggingFact,
            Uuid::new_v4(),
            "another sql database error seen",
            Some(Utc::now()),
        )
        .unwrap();

    assert_eq!(next.decision, BoxDecision::Merged);
    assert_eq!(next.memory_box.id, first.memory_box.id);
    assert_eq!(reopened.get_box_items(first.memory_box.id).unwrap().len(), 2);
}

/// Inactive boxes are not candidates after a restart
#[test]
fn test_inactive_box_is_not_continued_after_restart() {
    let db = TestDatabaseManager::new_temp();

    let first = db
        .builder()
        .add_memory(
            MemoryType::ClaudeMemory,
            Uuid::new_v4(),
            "deploy server build",
            None,
        )
        .unwrap();
    db.storage.set_box_active(first.memory_box.id, false).unwrap();

    let mut builder = db.builder();
    assert!(builder.loom().is_empty());

    let next = builder
        .add_memory(
            MemoryType::ClaudeMemory,
            Uuid::new_v4(),
            "deploy server build again",
            None,
        )
        .unwrap();
    assert_eq!(next.decision, BoxDecision::Created);
    assert_ne!(next.memory_box.id, first.memory_box.id);
}
