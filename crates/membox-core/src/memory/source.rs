//! Source memories and read models built over boxes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MemoryBox, MemoryType};

/// A memory to be written into its source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceRecord {
    /// Debugging fact; content is rendered as `symptom: solution`
    DebuggingFact { symptom: String, solution: String },
    /// Free-form assistant memory
    ClaudeMemory { content: String },
    /// Crystallization event; the understanding wins over the resolving content
    Crystallization {
        understanding: Option<String>,
        resolving_content: Option<String>,
    },
    /// Session narrative
    Narrative { text: String },
}

impl SourceRecord {
    /// Memory type this record belongs to
    pub fn memory_type(&self) -> MemoryType {
        match self {
            SourceRecord::DebuggingFact { .. } => MemoryType::DebuggingFact,
            SourceRecord::ClaudeMemory { .. } => MemoryType::ClaudeMemory,
            SourceRecord::Crystallization { .. } => MemoryType::Crystallization,
            SourceRecord::Narrative { .. } => MemoryType::Narrative,
        }
    }

    /// Text content, rendered the same way the source table query renders it
    pub fn content(&self) -> Option<String> {
        match self {
            SourceRecord::DebuggingFact { symptom, solution } => {
                Some(format!("{}: {}", symptom, solution))
            }
            SourceRecord::ClaudeMemory { content } => Some(content.clone()),
            SourceRecord::Crystallization {
                understanding,
                resolving_content,
            } => understanding.clone().or_else(|| resolving_content.clone()),
            SourceRecord::Narrative { text } => Some(text.clone()),
        }
    }

    /// Plain-text record for the given type
    ///
    /// Debugging facts split on the first `": "` into symptom and solution.
    pub fn from_text(memory_type: MemoryType, text: impl Into<String>) -> Self {
        let text = text.into();
        match memory_type {
            MemoryType::DebuggingFact => match text.split_once(": ") {
                Some((symptom, solution)) => SourceRecord::DebuggingFact {
                    symptom: symptom.to_string(),
                    solution: solution.to_string(),
                },
                None => SourceRecord::DebuggingFact {
                    symptom: text,
                    solution: String::new(),
                },
            },
            MemoryType::ClaudeMemory => SourceRecord::ClaudeMemory { content: text },
            MemoryType::Crystallization => SourceRecord::Crystallization {
                understanding: Some(text),
                resolving_content: None,
            },
            MemoryType::Narrative => SourceRecord::Narrative { text },
        }
    }
}

/// A source memory not yet assigned to any box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMemory {
    /// Kind of memory
    pub memory_type: MemoryType,
    /// ID in the source table
    pub memory_id: Uuid,
    /// Text content
    pub content: String,
    /// Creation time in the source table
    pub created_at: DateTime<Utc>,
}

/// A box item joined with its content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxMemory {
    /// Kind of memory
    pub memory_type: MemoryType,
    /// ID in the source table
    pub memory_id: Uuid,
    /// Position within the box
    pub position: i64,
    /// Text content
    pub content: String,
}

/// A box reached through a trace link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedBox {
    /// The box on the other end of the link
    pub memory_box: MemoryBox,
    /// Jaccard similarity of the two event sets
    pub similarity_score: f64,
    /// Events shared by both boxes
    pub linking_events: Vec<String>,
}

/// Aggregate statistics over the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemboxStats {
    /// Total boxes
    pub total_boxes: i64,
    /// Boxes with the active flag set
    pub active_boxes: i64,
    /// Total box items
    pub total_items: i64,
    /// Total trace links
    pub total_links: i64,
    /// Average items per box
    pub average_box_size: f64,
    /// Largest box size
    pub largest_box_size: i64,
    /// Earliest box start time
    pub oldest_memory: Option<DateTime<Utc>>,
    /// Latest box end time
    pub newest_memory: Option<DateTime<Utc>>,
}
