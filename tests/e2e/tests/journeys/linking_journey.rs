//! # Linking Journey Tests
//!
//! Boxes on different topics that record the same events get linked:
//!
//! 1. Identical event sets link at full similarity
//! 2. Two shared events link even when the overall overlap is low
//! 3. Linked boxes are reachable from either end
//! 4. Search finds boxes by topic text and by keyword

use membox_core::{BoxDecision, BoxStore, LinkType, MemoryType};
use membox_e2e_tests::{TestDataFactory, TestDatabaseManager};
use uuid::Uuid;

const SHARED_ACTIONS: [&str; 2] = ["Fixed the flaky login test.", "Added retry logic."];

fn rust_note() -> String {
    TestDataFactory::with_events("Rust cache layer", &SHARED_ACTIONS)
}

fn python_note() -> String {
    TestDataFactory::with_events("Python api client", &SHARED_ACTIONS)
}

fn go_note() -> String {
    TestDataFactory::with_events(
        "Go server rollout",
        &[
            SHARED_ACTIONS[0],
            SHARED_ACTIONS[1],
            "Created a new dashboard page.",
            "Updated the release notes.",
            "Removed the legacy endpoint.",
        ],
    )
}

// ============================================================================
// LINK CREATION
// ============================================================================

/// Separate boxes with identical events link at 1.0
#[test]
fn test_identical_events_link_boxes() {
    let db = TestDatabaseManager::new_temp();
    let mut builder = db.builder();

    let rust = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &rust_note(), None)
        .unwrap();
    assert!(rust.links.is_empty());
    assert_eq!(
        rust.memory_box.events,
        vec!["the flaky login test".to_string(), "retry logic".to_string()]
    );

    let python = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &python_note(), None)
        .unwrap();
    assert_eq!(python.decision, BoxDecision::Created);
    assert_ne!(python.memory_box.id, rust.memory_box.id);

    assert_eq!(python.links.len(), 1);
    let link = &python.links[0];
    assert_eq!(link.link_type, LinkType::EventSimilarity);
    assert_eq!(link.similarity_score, 1.0);
    assert_eq!(link.other_end(python.memory_box.id), rust.memory_box.id);
    assert_eq!(link.linking_events.len(), 2);

    assert_eq!(db.link_count(), 1);
}

/// Two shared events are enough even below the similarity threshold
#[test]
fn test_two_shared_events_link_despite_low_overlap() {
    let db = TestDatabaseManager::new_temp();
    let mut builder = db.builder();

    let rust = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &rust_note(), None)
        .unwrap();
    let go = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &go_note(), None)
        .unwrap();

    assert_eq!(go.memory_box.events.len(), 5);
    assert_eq!(go.links.len(), 1);

    let link = &go.links[0];
    assert!((link.similarity_score - 0.4).abs() < 1e-9);
    assert_eq!(link.other_end(go.memory_box.id), rust.memory_box.id);
    assert!(link.linking_events.contains(&"the flaky login test".to_string()));
    assert!(link.linking_events.contains(&"retry logic".to_string()));
}

/// Re-weaving the same pair updates the one link instead of adding another
#[test]
fn test_links_are_unique_per_pair() {
    let db = TestDatabaseManager::new_temp();
    let mut builder = db.builder();

    let rust = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &rust_note(), None)
        .unwrap();
    builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &python_note(), None)
        .unwrap();

    let rewoven = builder
        .weaver()
        .weave(&*db.storage, rust.memory_box.id)
        .unwrap();
    assert_eq!(rewoven.len(), 1);
    assert_eq!(db.link_count(), 1);
}

// ============================================================================
// TRAVERSAL
// ============================================================================

/// Links are visible from both boxes, strongest first
#[test]
fn test_linked_boxes_from_either_end() {
    let db = TestDatabaseManager::new_temp();
    let mut builder = db.builder();

    let rust = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &rust_note(), None)
        .unwrap();
    let python = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &python_note(), None)
        .unwrap();
    let go = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &go_note(), None)
        .unwrap();
    assert_eq!(go.links.len(), 2);
    assert_eq!(db.link_count(), 3);

    let from_rust = db.storage.get_linked_boxes(rust.memory_box.id, 10).unwrap();
    assert_eq!(from_rust.len(), 2);
    assert_eq!(from_rust[0].memory_box.id, python.memory_box.id);
    assert_eq!(from_rust[0].similarity_score, 1.0);
    assert_eq!(from_rust[1].memory_box.id, go.memory_box.id);

    let from_go = db.storage.get_linked_boxes(go.memory_box.id, 1).unwrap();
    assert_eq!(from_go.len(), 1);
}

// ============================================================================
// SEARCH
// ============================================================================

/// Search matches topic text and stored keywords, active boxes only
#[test]
fn test_search_finds_boxes_by_topic_and_keyword() {
    let db = TestDatabaseManager::new_temp();
    let mut builder = db.builder();

    let rust = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &rust_note(), None)
        .unwrap();
    let python = builder
        .add_memory(MemoryType::ClaudeMemory, Uuid::new_v4(), &python_note(), None)
        .unwrap();

    let by_topic = db.storage.search_boxes("layer", 0.0, 10).unwrap();
    assert_eq!(by_topic.len(), 1);
    assert_eq!(by_topic[0].id, rust.memory_box.id);

    let by_keyword = db.storage.search_boxes("python", 0.0, 10).unwrap();
    assert_eq!(by_keyword.len(), 1);
    assert_eq!(by_keyword[0].id, python.memory_box.id);

    let shared = db.storage.search_boxes("test", 0.0, 10).unwrap();
    assert_eq!(shared.len(), 2);

    assert!(db.storage.search_boxes("test", 50.0, 10).unwrap().is_empty());

    db.storage.set_box_active(rust.memory_box.id, false).unwrap();
    let after = db.storage.search_boxes("test", 0.0, 10).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, python.memory_box.id);
}
