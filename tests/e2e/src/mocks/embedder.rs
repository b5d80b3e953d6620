//! Deterministic bag-of-words embedder
//!
//! Each distinct lower-case token gets the next free dimension the first time
//! it is seen, and a text embeds to the 0/1 presence vector of its tokens.
//! Cosine similarity is then |shared tokens| / sqrt(|A| * |B|), which makes
//! continuation thresholds easy to hit exactly in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use membox_core::embeddings::{Embedder, Embedding, EmbeddingError};

/// Vector size; tokens past this many wrap around and may collide
pub const TOKEN_DIMENSIONS: usize = 64;

/// Presence-vector embedder with a shared token index
#[derive(Debug, Default)]
pub struct TokenEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
}

impl TokenEmbedder {
    /// Create an embedder with an empty token index
    pub fn new() -> Self {
        Self::default()
    }

    fn tokens(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Embedder for TokenEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let tokens = Self::tokens(text);
        if tokens.is_empty() {
            return Err(EmbeddingError::InvalidInput("no tokens".into()));
        }

        let mut vocabulary = self
            .vocabulary
            .lock()
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        let mut vector = vec![0.0_f32; TOKEN_DIMENSIONS];
        for token in tokens {
            let next = vocabulary.len();
            let index = *vocabulary.entry(token).or_insert(next);
            vector[index % TOKEN_DIMENSIONS] = 1.0;
        }

        Ok(Embedding::new(vector))
    }

    fn model_name(&self) -> &str {
        "token-presence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_shared_tokens_score_one_half() {
        let embedder = TokenEmbedder::new();
        let a = embedder.embed("alpha beta gamma delta").unwrap();
        let b = embedder.embed("alpha beta epsilon zeta").unwrap();
        assert_eq!(a.cosine_similarity(&b), 0.5);
    }

    #[test]
    fn test_repeated_tokens_count_once() {
        let embedder = TokenEmbedder::new();
        let a = embedder.embed("pool pool pool").unwrap();
        let b = embedder.embed("pool").unwrap();
        assert_eq!(a.cosine_similarity(&b), 1.0);
    }

    #[test]
    fn test_empty_text_fails() {
        assert!(TokenEmbedder::new().embed(" .. ").is_err());
    }
}
