//! Storage contract used by the engine.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Result;
use crate::memory::{BoxUpdate, MemoryBox, MemoryRef, MemoryType, PendingMemory, TraceLink};

/// Persistence operations the builder, weaver and worker depend on
///
/// Implementations must be `Send + Sync`. `create_box` and `update_box` are
/// each one transaction: the box row and its item row are written together
/// or not at all.
pub trait BoxStore: Send + Sync {
    /// Fetch a box by ID
    fn get_box(&self, id: Uuid) -> Result<Option<MemoryBox>>;

    /// Insert a new box with `memory` as its item at position 1
    fn create_box(&self, memory_box: &MemoryBox, memory: MemoryRef) -> Result<MemoryBox>;

    /// Merge `update` into an existing box and append `memory` at the next position
    ///
    /// A missing box is [`StorageError::NotFound`](super::StorageError::NotFound).
    fn update_box(&self, id: Uuid, update: &BoxUpdate, memory: MemoryRef) -> Result<MemoryBox>;

    /// Position the next item of `box_id` would take (1 for an empty box)
    fn next_position(&self, box_id: Uuid) -> Result<i64>;

    /// Other active boxes sharing at least one of `events`, by score descending
    fn find_overlapping_boxes(
        &self,
        box_id: Uuid,
        events: &[String],
        limit: usize,
    ) -> Result<Vec<MemoryBox>>;

    /// Insert or replace the link for the link's unordered box pair
    fn upsert_link(&self, link: &TraceLink) -> Result<()>;

    /// Active boxes, most recently updated first
    fn list_recent_active_boxes(&self, limit: usize) -> Result<Vec<MemoryBox>>;

    /// Active boxes matching `query` on topic text or an exact keyword
    fn search_boxes(&self, query: &str, min_score: f64, limit: usize) -> Result<Vec<MemoryBox>>;

    /// Source memories created since `since` that no box holds yet
    ///
    /// Up to `limit` per memory type, newest first within each type.
    fn pending_memories(
        &self,
        since: DateTime<Utc>,
        limit: usize,
        types: &[MemoryType],
    ) -> Result<Vec<PendingMemory>>;
}
