//! Box lifecycle: creating boxes and merging memories into them.
//!
//! Field-merge rules live on [`MemoryBox::apply_update`]; these functions
//! turn a signature into the store calls that apply them atomically.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::memory::{BoxUpdate, MemoryBox, MemoryRef, MERGE_SCORE_DELTA};
use crate::signature::TopicSignature;
use crate::storage::{BoxStore, Result};

/// Open a new box holding a single memory
pub fn create_box<S: BoxStore + ?Sized>(
    store: &S,
    signature: &TopicSignature,
    timestamp: DateTime<Utc>,
    memory: MemoryRef,
) -> Result<MemoryBox> {
    let memory_box = MemoryBox::new(
        signature.topic.clone(),
        &signature.keywords,
        &signature.events,
        timestamp,
    );
    let created = store.create_box(&memory_box, memory)?;

    tracing::info!(
        "Created box {} ({}) from {} {}",
        created.id,
        created.topic,
        memory.memory_type,
        memory.memory_id
    );
    Ok(created)
}

/// Fold a memory into an existing box
pub fn merge_into_box<S: BoxStore + ?Sized>(
    store: &S,
    box_id: Uuid,
    signature: &TopicSignature,
    timestamp: DateTime<Utc>,
    memory: MemoryRef,
) -> Result<MemoryBox> {
    let update = BoxUpdate {
        keywords: signature.keywords.clone(),
        events: signature.events.clone(),
        timestamp,
        score_delta: MERGE_SCORE_DELTA,
    };
    let merged = store.update_box(box_id, &update, memory)?;

    tracing::info!(
        "Merged {} {} into box {} (count {})",
        memory.memory_type,
        memory.memory_id,
        merged.id,
        merged.memory_count
    );
    Ok(merged)
}
