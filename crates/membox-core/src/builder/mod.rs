//! Membox Builder
//!
//! Orchestrates the pipeline for one memory at a time:
//!
//! 1. Extract a signature from the content
//! 2. Ask the loom whether it continues a box in the window
//! 3. Merge into that box, or create a new one
//! 4. Push the signature and its box into the window
//! 5. Find and save trace links for the affected box
//!
//! Each builder owns its window. A new builder seeds the window from the
//! store's most recently updated active boxes, so separate processes pick
//! up where earlier runs left off.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embeddings::Embedder;
use crate::lifecycle::{create_box, merge_into_box};
use crate::loom::{LoomConfig, TopicLoom};
use crate::memory::{MemoryBox, MemoryRef, MemoryType, TraceLink};
use crate::signature::{SignatureExtractor, TopicSignature};
use crate::storage::{BoxStore, Result};
use crate::weaver::{TraceWeaver, WeaverConfig};

/// Default number of boxes loaded into a fresh window
pub const DEFAULT_BOOTSTRAP_LIMIT: usize = 20;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the builder and its components
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Continuation detection
    pub loom: LoomConfig,
    /// Link discovery
    pub weaver: WeaverConfig,
    /// Recent active boxes loaded into the window at startup
    pub bootstrap_limit: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            loom: LoomConfig::default(),
            weaver: WeaverConfig::default(),
            bootstrap_limit: DEFAULT_BOOTSTRAP_LIMIT,
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// What happened to a memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxDecision {
    /// A new box was opened
    Created,
    /// The memory continued an existing box
    Merged,
}

impl std::fmt::Display for BoxDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoxDecision::Created => write!(f, "created"),
            BoxDecision::Merged => write!(f, "merged"),
        }
    }
}

/// Outcome of [`MemboxBuilder::add_memory`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemoryResult {
    /// Created or merged
    pub decision: BoxDecision,
    /// The box after the operation
    pub memory_box: MemoryBox,
    /// Links saved for the box
    pub links: Vec<TraceLink>,
}

impl AddMemoryResult {
    /// Whether the memory continued an existing box
    pub fn is_continuation(&self) -> bool {
        self.decision == BoxDecision::Merged
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Groups memories into boxes and links the boxes
pub struct MemboxBuilder<S: BoxStore + ?Sized> {
    store: Arc<S>,
    extractor: SignatureExtractor,
    loom: TopicLoom,
    weaver: TraceWeaver,
}

impl<S: BoxStore + ?Sized> MemboxBuilder<S> {
    /// Create a builder with default configuration and a seeded window
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, BuilderConfig::default())
    }

    /// Create a builder with custom configuration and a seeded window
    pub fn with_config(store: Arc<S>, config: BuilderConfig) -> Self {
        let mut builder = Self {
            store,
            extractor: SignatureExtractor::new(),
            loom: TopicLoom::with_config(config.loom),
            weaver: TraceWeaver::with_config(config.weaver),
        };
        builder.bootstrap(config.bootstrap_limit);
        builder
    }

    /// Embed memory content for continuation detection
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.extractor = SignatureExtractor::with_embedder(embedder);
        self
    }

    /// Seed the window from recently updated active boxes
    ///
    /// Seeded signatures carry topic, keywords and events but no embedding.
    /// Store failures leave the window empty. Returns the number of entries
    /// loaded.
    fn bootstrap(&mut self, limit: usize) -> usize {
        if limit == 0 {
            return 0;
        }

        match self.store.list_recent_active_boxes(limit) {
            Ok(boxes) => {
                let count = boxes.len();
                // Store returns newest first; the window wants oldest first
                self.loom.seed(boxes.into_iter().rev().map(|b| {
                    (
                        TopicSignature::new(b.topic, b.keywords, b.events),
                        b.id,
                    )
                }));
                tracing::debug!("Bootstrapped window with {} boxes", count);
                count
            }
            Err(e) => {
                tracing::warn!("Window bootstrap failed, starting empty: {}", e);
                0
            }
        }
    }

    /// Add one memory, creating or continuing a box and refreshing its links
    ///
    /// `timestamp` defaults to now.
    pub fn add_memory(
        &mut self,
        memory_type: MemoryType,
        memory_id: Uuid,
        content: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<AddMemoryResult> {
        let timestamp = timestamp.unwrap_or_else(Utc::now);
        let memory = MemoryRef::new(memory_type, memory_id);
        let signature = self.extractor.extract(content);

        let (decision, memory_box) = match self.loom.find_continuation(&signature) {
            Some(continuation) => {
                tracing::debug!(
                    "{} {} continues box {} ({} {:.3})",
                    memory_type,
                    memory_id,
                    continuation.box_id,
                    continuation.method,
                    continuation.score
                );
                let merged = merge_into_box(
                    &*self.store,
                    continuation.box_id,
                    &signature,
                    timestamp,
                    memory,
                )?;
                (BoxDecision::Merged, merged)
            }
            None => {
                let created = create_box(&*self.store, &signature, timestamp, memory)?;
                (BoxDecision::Created, created)
            }
        };

        self.loom.add_to_window(signature, memory_box.id);

        let links = self.weaver.weave(&*self.store, memory_box.id)?;

        Ok(AddMemoryResult {
            decision,
            memory_box,
            links,
        })
    }

    /// The backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The continuation window
    pub fn loom(&self) -> &TopicLoom {
        &self.loom
    }

    /// The link weaver
    pub fn weaver(&self) -> &TraceWeaver {
        &self.weaver
    }
}

// ============================================================================
// TESTS
// ============================================================================
