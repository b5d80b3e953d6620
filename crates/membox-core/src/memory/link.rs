//! Trace links between boxes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of relationship a trace link records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    /// Boxes share extracted events
    EventSimilarity,
}

impl LinkType {
    /// Stable tag stored in `trace_links.link_type`
    pub const fn as_str(self) -> &'static str {
        match self {
            LinkType::EventSimilarity => "event_similarity",
        }
    }
}

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event_similarity" => Ok(LinkType::EventSimilarity),
            _ => Err(format!("Unknown link type: {}", s)),
        }
    }
}

/// A connection between two boxes via shared events
///
/// Links are symmetric. `find_links` reports them from the queried box's
/// point of view; storage keeps one row per unordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceLink {
    /// Link ID
    pub id: Uuid,
    /// Box the link was discovered from
    pub source_box_id: Uuid,
    /// Linked box
    pub target_box_id: Uuid,
    /// Relationship kind
    pub link_type: LinkType,
    /// Jaccard similarity of the two event sets (0.0 - 1.0)
    pub similarity_score: f64,
    /// Events present in both boxes
    pub linking_events: Vec<String>,
}

impl TraceLink {
    /// Create a new event-similarity link
    pub fn event_similarity(
        source_box_id: Uuid,
        target_box_id: Uuid,
        similarity_score: f64,
        linking_events: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_box_id,
            target_box_id,
            link_type: LinkType::EventSimilarity,
            similarity_score,
            linking_events,
        }
    }

    /// Same link with `source_box_id < target_box_id`
    pub fn canonical(&self) -> Self {
        let mut link = self.clone();
        if link.source_box_id > link.target_box_id {
            std::mem::swap(&mut link.source_box_id, &mut link.target_box_id);
        }
        link
    }

    /// The box on the other end, seen from `box_id`
    pub fn other_end(&self, box_id: Uuid) -> Uuid {
        if self.source_box_id == box_id {
            self.target_box_id
        } else {
            self.source_box_id
        }
    }
}
