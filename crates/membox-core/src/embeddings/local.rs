//! Local Sentence Embeddings
//!
//! Uses fastembed v5 for local ONNX inference with all-MiniLM-L6-v2
//! (384 dimensions). The model is loaded lazily on first use and shared by
//! every service instance in the process.

use std::sync::{Mutex, OnceLock};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{Embedder, Embedding, EmbeddingError};

/// Output dimensions of all-MiniLM-L6-v2
pub const EMBEDDING_DIMENSIONS: usize = 384;

/// Model identifier reported in logs and stats
pub const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Result of the one-time model initialization
static EMBEDDING_MODEL_RESULT: OnceLock<Result<Mutex<TextEmbedding>, String>> = OnceLock::new();

/// Cache directory for model files
/// Uses FASTEMBED_CACHE_PATH env var, or falls back to the platform cache directory
fn get_cache_dir() -> std::path::PathBuf {
    if let Ok(path) = std::env::var("FASTEMBED_CACHE_PATH") {
        return std::path::PathBuf::from(path);
    }

    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "membox", "core") {
        return proj_dirs.cache_dir().join("fastembed");
    }

    std::path::PathBuf::from(".fastembed_cache")
}

fn get_model() -> Result<std::sync::MutexGuard<'static, TextEmbedding>, EmbeddingError> {
    let result = EMBEDDING_MODEL_RESULT.get_or_init(|| {
        let cache_dir = get_cache_dir();
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            tracing::warn!("Failed to create cache directory {:?}: {}", cache_dir, e);
        }

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false)
            .with_cache_dir(cache_dir);

        TextEmbedding::try_new(options)
            .map(Mutex::new)
            .map_err(|e| format!("Failed to initialize {}: {}", MODEL_NAME, e))
    });

    match result {
        Ok(model) => model
            .lock()
            .map_err(|e| EmbeddingError::ModelInit(format!("Lock poisoned: {}", e))),
        Err(err) => Err(EmbeddingError::ModelInit(err.clone())),
    }
}

/// fastembed-backed [`Embedder`]
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddingService;

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new() -> Self {
        Self
    }

    /// Load the model now (downloads if necessary) and report failures
    pub fn init(&self) -> Result<(), EmbeddingError> {
        get_model().map(|_| ())
    }

    /// Check if the model is ready
    pub fn is_ready(&self) -> bool {
        match get_model() {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Embedding model not ready: {}", e);
                false
            }
        }
    }
}

impl Embedder for EmbeddingService {
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Text cannot be empty".to_string(),
            ));
        }

        let mut model = get_model()?;
        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .map(Embedding::new)
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding generated".to_string()))
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
