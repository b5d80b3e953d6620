//! Memory module - Core types and data structures
//!
//! - Memory types and where their content lives
//! - Memory boxes and their ordered items
//! - Trace links between boxes
//! - Set helpers shared by continuation and linking

mod link;
mod membox;
mod sets;
mod source;

pub use link::{LinkType, TraceLink};
pub use membox::{
    BoxUpdate, MemoryBox, MemoryBoxItem, MemoryRef, BASE_BOX_SCORE, MAX_BOX_EVENTS,
    MAX_BOX_KEYWORDS, MERGE_SCORE_DELTA,
};
pub use sets::{jaccard_similarity, union_capped};
pub use source::{BoxMemory, LinkedBox, MemboxStats, PendingMemory, SourceRecord};

use serde::{Deserialize, Serialize};

// ============================================================================
// MEMORY TYPES
// ============================================================================

/// Kind of memory a box item points at
///
/// Each kind lives in its own source table with its own way of producing
/// text content; [`MemoryType::source`] is the single place that knows how.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Symptom/solution pair recorded while debugging
    DebuggingFact,
    /// Free-form note written by the assistant
    ClaudeMemory,
    /// A moment where understanding crystallized
    Crystallization,
    /// Session narrative
    Narrative,
}

/// Location and content expression of a memory type's source table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTable {
    /// Table name
    pub table: &'static str,
    /// Primary key column
    pub id_column: &'static str,
    /// SQL expression producing the memory's text
    pub content_expr: &'static str,
    /// Column holding the creation timestamp
    pub created_column: &'static str,
}

impl MemoryType {
    /// All memory types, in declaration order
    pub const ALL: [MemoryType; 4] = [
        MemoryType::DebuggingFact,
        MemoryType::ClaudeMemory,
        MemoryType::Crystallization,
        MemoryType::Narrative,
    ];

    /// Types processed by the batch worker when none are given
    pub const DEFAULT_WORKER_TYPES: [MemoryType; 3] = [
        MemoryType::DebuggingFact,
        MemoryType::ClaudeMemory,
        MemoryType::Crystallization,
    ];

    /// Stable tag stored in `memory_box_items.memory_type`
    pub const fn as_str(self) -> &'static str {
        match self {
            MemoryType::DebuggingFact => "debugging_fact",
            MemoryType::ClaudeMemory => "claude_memory",
            MemoryType::Crystallization => "crystallization",
            MemoryType::Narrative => "narrative",
        }
    }

    /// Where this type's content is read from
    pub const fn source(self) -> SourceTable {
        match self {
            MemoryType::DebuggingFact => SourceTable {
                table: "debugging_facts",
                id_column: "fact_id",
                content_expr: "symptom || ': ' || solution",
                created_column: "first_seen",
            },
            MemoryType::ClaudeMemory => SourceTable {
                table: "claude_memories",
                id_column: "id",
                content_expr: "content",
                created_column: "created_at",
            },
            MemoryType::Crystallization => SourceTable {
                table: "crystallization_events",
                id_column: "id",
                content_expr: "COALESCE(understanding_as_crystallized, resolving_content)",
                created_column: "created_at",
            },
            MemoryType::Narrative => SourceTable {
                table: "session_narratives",
                id_column: "id",
                content_expr: "narrative_text",
                created_column: "created_at",
            },
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debugging_fact" | "debugging-fact" | "fact" => Ok(MemoryType::DebuggingFact),
            "claude_memory" | "claude-memory" | "memory" => Ok(MemoryType::ClaudeMemory),
            "crystallization" => Ok(MemoryType::Crystallization),
            "narrative" => Ok(MemoryType::Narrative),
            _ => Err(format!("Unknown memory type: {}", s)),
        }
    }
}
