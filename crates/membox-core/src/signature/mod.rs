//! Signature Extraction
//!
//! Turns the text of one memory into a [`TopicSignature`]: a topic label,
//! controlled-vocabulary keywords, action-oriented event phrases and,
//! when an embedder is configured, an embedding.
//!
//! Extraction never fails. Empty or malformed content yields the
//! [`UNKNOWN_TOPIC`] label and empty keyword/event lists.

mod vocabulary;

pub use vocabulary::{is_keyword, EVENT_PATTERNS, TECH_KEYWORDS};

use std::collections::HashSet;
use std::sync::Arc;

use crate::embeddings::{Embedder, Embedding};
use vocabulary::{EVENT_REGEXES, WORD};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Topic label used when the content has no non-empty line
pub const UNKNOWN_TOPIC: &str = "Unknown";

/// Maximum characters in a topic label
pub const MAX_TOPIC_CHARS: usize = 100;

/// Maximum keywords per signature
pub const MAX_KEYWORDS: usize = 10;

/// Maximum events per signature
pub const MAX_EVENTS: usize = 5;

/// Maximum matches taken from each event pattern
pub const MAX_MATCHES_PER_PATTERN: usize = 2;

/// Maximum characters in an event phrase
pub const MAX_EVENT_CHARS: usize = 80;

/// Event phrases must be longer than this many characters
pub const MIN_EVENT_CHARS: usize = 5;

/// Characters of content handed to the embedder
pub const MAX_EMBED_CHARS: usize = 1000;

// ============================================================================
// SIGNATURE
// ============================================================================

/// Topic fingerprint of one memory
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSignature {
    /// First non-empty line, truncated
    pub topic: String,
    /// Vocabulary terms present in the content (set semantics)
    pub keywords: Vec<String>,
    /// Event phrases in pattern order
    pub events: Vec<String>,
    /// Embedding of the leading content; `None` when no model ran
    pub embedding: Option<Embedding>,
}

impl TopicSignature {
    /// Signature without an embedding
    pub fn new(topic: impl Into<String>, keywords: Vec<String>, events: Vec<String>) -> Self {
        Self {
            topic: topic.into(),
            keywords,
            events,
            embedding: None,
        }
    }

    /// Attach an embedding
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Produces signatures, optionally with embeddings
#[derive(Clone, Default)]
pub struct SignatureExtractor {
    embedder: Option<Arc<dyn Embedder>>,
}

impl std::fmt::Debug for SignatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureExtractor")
            .field("embedder", &self.embedder.as_ref().map(|e| e.model_name().to_string()))
            .finish()
    }
}

impl SignatureExtractor {
    /// Keyword/event-only extractor
    pub fn new() -> Self {
        Self { embedder: None }
    }

    /// Extractor that also embeds content
    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder: Some(embedder),
        }
    }

    /// Whether an embedder is configured
    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// Extract the signature of `content`
    pub fn extract(&self, content: &str) -> TopicSignature {
        TopicSignature {
            topic: derive_topic(content),
            keywords: extract_keywords(content),
            events: extract_events(content),
            embedding: self.embed(content),
        }
    }

    fn embed(&self, content: &str) -> Option<Embedding> {
        let embedder = self.embedder.as_ref()?;
        if content.trim().is_empty() {
            return None;
        }

        let head = truncate_chars(content, MAX_EMBED_CHARS);
        match embedder.embed(head) {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                tracing::warn!("Embedding unavailable ({}), using keyword overlap: {}", embedder.model_name(), e);
                None
            }
        }
    }
}

// ============================================================================
// EXTRACTION FUNCTIONS
// ============================================================================

/// First non-empty line, trimmed and truncated, or [`UNKNOWN_TOPIC`]
pub fn derive_topic(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_chars(line, MAX_TOPIC_CHARS).to_string())
        .unwrap_or_else(|| UNKNOWN_TOPIC.to_string())
}

/// Vocabulary terms in order of first appearance, at most [`MAX_KEYWORDS`]
pub fn extract_keywords(content: &str) -> Vec<String> {
    let lowered = content.to_lowercase();
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for word in WORD.find_iter(&lowered).map(|m| m.as_str()) {
        if keywords.len() >= MAX_KEYWORDS {
            break;
        }
        if is_keyword(word) && seen.insert(word) {
            keywords.push(word.to_string());
        }
    }

    keywords
}

/// Event phrases collected pattern by pattern, at most [`MAX_EVENTS`]
pub fn extract_events(content: &str) -> Vec<String> {
    let mut events: Vec<String> = Vec::new();

    for pattern in EVENT_REGEXES.iter() {
        for caps in pattern.captures_iter(content).take(MAX_MATCHES_PER_PATTERN) {
            let Some(phrase) = caps.get(1) else {
                continue;
            };
            let event = truncate_chars(phrase.as_str().trim(), MAX_EVENT_CHARS);
            if event.chars().count() > MIN_EVENT_CHARS {
                events.push(event.to_string());
            }
        }
    }

    events.truncate(MAX_EVENTS);
    events
}

/// Prefix of `text` holding at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ============================================================================
// TESTS
// ============================================================================
