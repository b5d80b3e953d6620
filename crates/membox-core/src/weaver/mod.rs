//! Trace Weaving
//!
//! Links boxes that share extracted events. A candidate is linked when the
//! Jaccard similarity of the two event sets reaches the link threshold, or
//! when the boxes share at least [`MIN_SHARED_EVENTS`] events regardless of
//! similarity.

use std::cmp::Ordering;
use std::collections::HashSet;

use uuid::Uuid;

use crate::memory::{jaccard_similarity, TraceLink};
use crate::storage::{BoxStore, Result};

/// Default Jaccard similarity needed to link two boxes
pub const DEFAULT_LINK_THRESHOLD: f64 = 0.5;

/// Default number of links kept per box
pub const DEFAULT_MAX_LINKS: usize = 10;

/// Shared-event count that links boxes whatever their similarity
pub const MIN_SHARED_EVENTS: usize = 2;

/// Configuration for the trace weaver
#[derive(Debug, Clone)]
pub struct WeaverConfig {
    /// Minimum Jaccard similarity (inclusive)
    pub link_threshold: f64,
    /// Links kept per box
    pub max_links: usize,
}

impl Default for WeaverConfig {
    fn default() -> Self {
        Self {
            link_threshold: DEFAULT_LINK_THRESHOLD,
            max_links: DEFAULT_MAX_LINKS,
        }
    }
}

/// Discovers and persists event-similarity links
#[derive(Debug, Clone, Default)]
pub struct TraceWeaver {
    config: WeaverConfig,
}

impl TraceWeaver {
    /// Create a weaver with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a weaver with custom configuration
    pub fn with_config(config: WeaverConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &WeaverConfig {
        &self.config
    }

    /// Links from `box_id` to other active boxes, strongest first
    ///
    /// Missing boxes and boxes without events have no links. Candidates come
    /// from the store ordered by score, over-fetched to twice `max_links`.
    pub fn find_links<S: BoxStore + ?Sized>(
        &self,
        store: &S,
        box_id: Uuid,
        max_links: usize,
    ) -> Result<Vec<TraceLink>> {
        let Some(source) = store.get_box(box_id)? else {
            return Ok(Vec::new());
        };
        if source.events.is_empty() || max_links == 0 {
            return Ok(Vec::new());
        }

        let candidates =
            store.find_overlapping_boxes(box_id, &source.events, max_links.saturating_mul(2))?;

        let mut links = Vec::new();
        for candidate in candidates {
            let candidate_events: HashSet<&str> =
                candidate.events.iter().map(String::as_str).collect();
            let shared: Vec<String> = source
                .events
                .iter()
                .filter(|e| candidate_events.contains(e.as_str()))
                .cloned()
                .collect();

            let similarity = jaccard_similarity(&source.events, &candidate.events);
            if similarity >= self.config.link_threshold || shared.len() >= MIN_SHARED_EVENTS {
                links.push(TraceLink::event_similarity(
                    box_id,
                    candidate.id,
                    similarity,
                    shared,
                ));
            }
        }

        links.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(Ordering::Equal)
        });
        links.truncate(max_links);

        tracing::debug!("Found {} links for box {}", links.len(), box_id);
        Ok(links)
    }

    /// Upsert every link; returns how many were written
    pub fn save_links<S: BoxStore + ?Sized>(&self, store: &S, links: &[TraceLink]) -> Result<usize> {
        for link in links {
            store.upsert_link(link)?;
        }
        if !links.is_empty() {
            tracing::info!("Saved {} trace links", links.len());
        }
        Ok(links.len())
    }

    /// Find and save links for `box_id` using the configured limit
    pub fn weave<S: BoxStore + ?Sized>(&self, store: &S, box_id: Uuid) -> Result<Vec<TraceLink>> {
        let links = self.find_links(store, box_id, self.config.max_links)?;
        self.save_links(store, &links)?;
        Ok(links)
    }
}
