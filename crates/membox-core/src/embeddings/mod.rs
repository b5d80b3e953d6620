//! Embeddings Module
//!
//! The embedding model is an optional collaborator. Everything in the engine
//! works through the [`Embedder`] trait, and a builder without an embedder runs
//! in pure keyword-overlap mode.
//!
//! - [`Embedding`] vector type and cosine similarity
//! - [`CachedEmbedder`] LRU wrapper for repeated content
//! - `EmbeddingService` (feature `embeddings`): local fastembed inference

mod cache;
#[cfg(feature = "embeddings")]
mod local;

pub use cache::CachedEmbedder;

#[cfg(feature = "embeddings")]
#[cfg_attr(docsrs, doc(cfg(feature = "embeddings")))]
pub use local::{EmbeddingService, EMBEDDING_DIMENSIONS, MODEL_NAME};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Embedding error types
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum EmbeddingError {
    /// Failed to initialize the embedding model
    ModelInit(String),
    /// Failed to generate embedding
    EmbeddingFailed(String),
    /// Invalid input (empty, too long, etc.)
    InvalidInput(String),
}

impl std::fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingError::ModelInit(e) => write!(f, "Model initialization failed: {}", e),
            EmbeddingError::EmbeddingFailed(e) => write!(f, "Embedding generation failed: {}", e),
            EmbeddingError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
        }
    }
}

impl std::error::Error for EmbeddingError {}

// ============================================================================
// EMBEDDING TYPE
// ============================================================================

/// A semantic embedding vector
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector
    pub vector: Vec<f32>,
    /// Dimensions of the vector
    pub dimensions: usize,
}

impl Embedding {
    /// Create a new embedding from a vector
    pub fn new(vector: Vec<f32>) -> Self {
        let dimensions = vector.len();
        Self { vector, dimensions }
    }

    /// Compute cosine similarity with another embedding
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimensions != other.dimensions {
            return 0.0;
        }
        cosine_similarity(&self.vector, &other.vector)
    }
}

// ============================================================================
// EMBEDDER TRAIT
// ============================================================================

/// Text-to-vector encoder.
///
/// Implementations may fail or be permanently unavailable; callers treat any
/// error as "no embedding" rather than as a failure of the operation.
pub trait Embedder: Send + Sync {
    /// Encode a single text
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Human-readable model name, used in logs
    fn model_name(&self) -> &str {
        "custom"
    }
}

impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        (**self).embed(text)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

// ============================================================================
// SIMILARITY FUNCTIONS
// ============================================================================

/// Compute cosine similarity between two vectors
///
/// Mismatched lengths and zero vectors score 0.0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator > 0.0 {
        dot_product / denominator
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
