//! Failure-injecting store
//!
//! Wraps a real [`Storage`] and refuses to create boxes whose topic contains
//! a marker string. Everything else passes through.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use membox_core::storage::{BoxStore, Result, StorageError};
use membox_core::{BoxUpdate, MemoryBox, MemoryRef, MemoryType, PendingMemory, Storage, TraceLink};
use uuid::Uuid;

/// Topic marker that makes [`FlakyStore::create_box`] fail
pub const POISON_MARKER: &str = "poison";

/// [`BoxStore`] that fails on poisoned topics
pub struct FlakyStore {
    inner: Arc<Storage>,
    marker: String,
}

impl FlakyStore {
    /// Wrap `inner`, failing creates whose topic contains [`POISON_MARKER`]
    pub fn new(inner: Arc<Storage>) -> Self {
        Self::with_marker(inner, POISON_MARKER)
    }

    /// Wrap `inner` with a custom marker
    pub fn with_marker(inner: Arc<Storage>, marker: impl Into<String>) -> Self {
        Self {
            inner,
            marker: marker.into(),
        }
    }

    /// The wrapped storage
    pub fn inner(&self) -> &Arc<Storage> {
        &self.inner
    }
}

impl BoxStore for FlakyStore {
    fn get_box(&self, id: Uuid) -> Result<Option<MemoryBox>> {
        self.inner.get_box(id)
    }

    fn create_box(&self, memory_box: &MemoryBox, memory: MemoryRef) -> Result<MemoryBox> {
        if memory_box.topic.contains(&self.marker) {
            return Err(StorageError::Init(format!(
                "injected failure for topic '{}'",
                memory_box.topic
            )));
        }
        self.inner.create_box(memory_box, memory)
    }

    fn update_box(&self, id: Uuid, update: &BoxUpdate, memory: MemoryRef) -> Result<MemoryBox> {
        self.inner.update_box(id, update, memory)
    }

    fn next_position(&self, box_id: Uuid) -> Result<i64> {
        self.inner.next_position(box_id)
    }

    fn find_overlapping_boxes(
        &self,
        box_id: Uuid,
        events: &[String],
        limit: usize,
    ) -> Result<Vec<MemoryBox>> {
        self.inner.find_overlapping_boxes(box_id, events, limit)
    }

    fn upsert_link(&self, link: &TraceLink) -> Result<()> {
        self.inner.upsert_link(link)
    }

    fn list_recent_active_boxes(&self, limit: usize) -> Result<Vec<MemoryBox>> {
        self.inner.list_recent_active_boxes(limit)
    }

    fn search_boxes(&self, query: &str, min_score: f64, limit: usize) -> Result<Vec<MemoryBox>> {
        self.inner.search_boxes(query, min_score, limit)
    }

    fn pending_memories(
        &self,
        since: DateTime<Utc>,
        limit: usize,
        types: &[MemoryType],
    ) -> Result<Vec<PendingMemory>> {
        self.inner.pending_memories(since, limit, types)
    }
}
