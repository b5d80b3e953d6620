//! Memory boxes and their items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MemoryType;
use super::sets::union_capped;

/// Score assigned to a freshly created box
pub const BASE_BOX_SCORE: f64 = 10.0;

/// Score added on every merge
pub const MERGE_SCORE_DELTA: f64 = 0.5;

/// Maximum keywords kept on a box
pub const MAX_BOX_KEYWORDS: usize = 20;

/// Maximum events kept on a box
pub const MAX_BOX_EVENTS: usize = 20;

/// A topic-continuous group of related memories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryBox {
    /// Unique box ID
    pub id: Uuid,
    /// Topic label of the first memory; never changes
    pub topic: String,
    /// Keyword set (insertion ordered, at most [`MAX_BOX_KEYWORDS`])
    pub keywords: Vec<String>,
    /// Event set (insertion ordered, at most [`MAX_BOX_EVENTS`])
    pub events: Vec<String>,
    /// External annotation, never written by the engine
    pub summary: Option<String>,
    /// Number of items in the box
    pub memory_count: i64,
    /// Recency/size proxy: base score plus a delta per merge
    pub score: f64,
    /// Earliest contributing memory timestamp
    pub start_time: DateTime<Utc>,
    /// Latest contributing memory timestamp
    pub end_time: DateTime<Utc>,
    /// Inactive boxes are skipped by linking, search and window bootstrap
    pub is_active: bool,
    /// When the row was created
    pub created_at: DateTime<Utc>,
    /// When the row was last modified
    pub updated_at: DateTime<Utc>,
}

impl MemoryBox {
    /// Build a new single-memory box
    pub fn new(
        topic: impl Into<String>,
        keywords: &[String],
        events: &[String],
        timestamp: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            keywords: union_capped(&[], keywords, MAX_BOX_KEYWORDS),
            events: union_capped(&[], events, MAX_BOX_EVENTS),
            summary: None,
            memory_count: 1,
            score: BASE_BOX_SCORE,
            start_time: timestamp,
            end_time: timestamp,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fold one more memory into this box
    ///
    /// Keywords and events are unioned and capped, the count and score grow,
    /// and the time span widens to cover `update.timestamp`.
    pub fn apply_update(&mut self, update: &BoxUpdate) {
        self.keywords = union_capped(&self.keywords, &update.keywords, MAX_BOX_KEYWORDS);
        self.events = union_capped(&self.events, &update.events, MAX_BOX_EVENTS);
        self.memory_count += 1;
        self.score += update.score_delta;
        self.end_time = self.end_time.max(update.timestamp);
        self.start_time = self.start_time.min(update.timestamp);
        self.updated_at = Utc::now();
    }
}

/// Incoming contribution for a merge
#[derive(Debug, Clone, PartialEq)]
pub struct BoxUpdate {
    /// Keywords of the merged memory
    pub keywords: Vec<String>,
    /// Events of the merged memory
    pub events: Vec<String>,
    /// Timestamp of the merged memory
    pub timestamp: DateTime<Utc>,
    /// Score increment
    pub score_delta: f64,
}

/// Reference to a memory in its source table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRef {
    /// Kind of memory
    pub memory_type: MemoryType,
    /// ID in the source table
    pub memory_id: Uuid,
}

impl MemoryRef {
    /// Create a memory reference
    pub fn new(memory_type: MemoryType, memory_id: Uuid) -> Self {
        Self {
            memory_type,
            memory_id,
        }
    }
}

/// A memory's membership in a box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryBoxItem {
    /// Owning box
    pub box_id: Uuid,
    /// Kind of memory
    pub memory_type: MemoryType,
    /// ID in the source table
    pub memory_id: Uuid,
    /// Dense 1-based processing order within the box
    pub position: i64,
}
