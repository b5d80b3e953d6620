//! Topic Continuation Detection
//!
//! The loom keeps a bounded window of recent signatures together with the
//! box each one was assigned to, and decides whether a new signature
//! continues one of those boxes.
//!
//! Two scoring paths:
//! - **Embedding**: best match. Every embedded entry in the window is scored
//!   and the highest cosine similarity wins (the first maximum on ties).
//! - **Keyword**: first match. Entries are scanned newest-first and the first
//!   one whose keyword Jaccard similarity reaches the threshold wins.
//!
//! The keyword path also runs when the embedding path finds nothing above
//! the threshold.

use uuid::Uuid;

use crate::memory::jaccard_similarity;
use crate::signature::TopicSignature;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Default number of signatures considered by the detector
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Default similarity needed to continue a box
pub const DEFAULT_CONTINUATION_THRESHOLD: f64 = 0.5;

/// Configuration for the topic loom
#[derive(Debug, Clone)]
pub struct LoomConfig {
    /// Number of most recent entries considered
    pub window_size: usize,
    /// Minimum similarity (inclusive) for a continuation
    pub continuation_threshold: f64,
}

impl Default for LoomConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            continuation_threshold: DEFAULT_CONTINUATION_THRESHOLD,
        }
    }
}

// ============================================================================
// WINDOW
// ============================================================================

/// A signature and the box it ended up in
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEntry {
    /// Signature of the memory
    pub signature: TopicSignature,
    /// Box the memory was created in or merged into
    pub box_id: Uuid,
}

/// Outcome of a continuation check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Continuation {
    /// Box being continued
    pub box_id: Uuid,
    /// Similarity that triggered the decision
    pub score: f64,
    /// Which path decided
    pub method: MatchMethod,
}

/// Path that produced a continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Cosine similarity of embeddings
    Embedding,
    /// Jaccard similarity of keyword sets
    Keyword,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::Embedding => write!(f, "embedding"),
            MatchMethod::Keyword => write!(f, "keyword"),
        }
    }
}

/// Sliding-window topic continuation detector
#[derive(Debug, Clone, Default)]
pub struct TopicLoom {
    config: LoomConfig,
    window: Vec<WindowEntry>,
}

impl TopicLoom {
    /// Create a loom with default configuration
    pub fn new() -> Self {
        Self::with_config(LoomConfig::default())
    }

    /// Create a loom with custom configuration
    pub fn with_config(config: LoomConfig) -> Self {
        Self {
            window: Vec::with_capacity(config.window_size.saturating_mul(2) + 1),
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &LoomConfig {
        &self.config
    }

    /// Buffered entries, including ones past the logical window
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether nothing has been seen yet
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// The newest `window_size` entries, oldest first
    pub fn recent(&self) -> &[WindowEntry] {
        let start = self.window.len().saturating_sub(self.config.window_size);
        &self.window[start..]
    }

    /// Whether `signature` continues a box in the window
    ///
    /// Returns `(true, Some(box_id))` on a continuation, `(false, None)`
    /// otherwise.
    pub fn is_continuation(&self, signature: &TopicSignature) -> (bool, Option<Uuid>) {
        match self.find_continuation(signature) {
            Some(c) => (true, Some(c.box_id)),
            None => (false, None),
        }
    }

    /// Same as [`is_continuation`](Self::is_continuation), with the score and path
    pub fn find_continuation(&self, signature: &TopicSignature) -> Option<Continuation> {
        let recent = self.recent();
        if recent.is_empty() {
            return None;
        }

        let threshold = self.config.continuation_threshold;

        if let Some(embedding) = &signature.embedding {
            let mut best: Option<Uuid> = None;
            let mut best_score = 0.0_f64;

            for entry in recent {
                let Some(other) = &entry.signature.embedding else {
                    continue;
                };
                let score = embedding.cosine_similarity(other) as f64;
                if score > best_score {
                    best_score = score;
                    best = Some(entry.box_id);
                }
            }

            if let Some(box_id) = best {
                if best_score >= threshold {
                    tracing::debug!("Continuation of {} by embedding ({:.3})", box_id, best_score);
                    return Some(Continuation {
                        box_id,
                        score: best_score,
                        method: MatchMethod::Embedding,
                    });
                }
            }
        }

        if signature.keywords.is_empty() {
            return None;
        }

        for entry in recent.iter().rev() {
            if entry.signature.keywords.is_empty() {
                continue;
            }
            let score = jaccard_similarity(&signature.keywords, &entry.signature.keywords);
            if score >= threshold {
                tracing::debug!("Continuation of {} by keywords ({:.3})", entry.box_id, score);
                return Some(Continuation {
                    box_id: entry.box_id,
                    score,
                    method: MatchMethod::Keyword,
                });
            }
        }

        None
    }

    /// Record that `signature` was assigned to `box_id`
    pub fn add_to_window(&mut self, signature: TopicSignature, box_id: Uuid) {
        self.window.push(WindowEntry { signature, box_id });

        let size = self.config.window_size;
        if self.window.len() > size.saturating_mul(2) {
            let excess = self.window.len() - size;
            self.window.drain(..excess);
        }
    }

    /// Seed the window with entries ordered oldest to newest
    pub fn seed(&mut self, entries: impl IntoIterator<Item = (TopicSignature, Uuid)>) {
        for (signature, box_id) in entries {
            self.add_to_window(signature, box_id);
        }
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.window.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================
