//! # Membox Core
//!
//! Incremental topic grouping for streams of short memories.
//!
//! Each memory is reduced to a signature (topic line, vocabulary keywords,
//! action events, optional embedding) and compared against a sliding window
//! of recent signatures. A match continues the matching box; otherwise a new
//! box opens. Boxes that share events are then cross-linked.
//!
//! - **Signature Extraction**: controlled-vocabulary keywords and regex event phrases
//! - **Topic Loom**: best-match embedding continuation with keyword-overlap fallback
//! - **Box Lifecycle**: atomic create/merge with capped keyword and event sets
//! - **Trace Weaving**: Jaccard event links with a shared-event override
//! - **Batch Worker**: cron-style sweeps over unboxed source memories
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use membox_core::prelude::*;
//!
//! // Create storage (uses default platform-specific location)
//! let storage = Arc::new(Storage::new(None)?);
//! let mut builder = MemboxBuilder::new(storage);
//!
//! let result = builder.add_memory(
//!     MemoryType::DebuggingFact,
//!     uuid::Uuid::new_v4(),
//!     "Fixed the database timeout by increasing pool size.",
//!     None,
//! )?;
//! println!("{} box {}", result.decision, result.memory_box.id);
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the binary
//! - `encryption`: SQLCipher-backed storage keyed by `MEMBOX_ENCRYPTION_KEY`
//! - `embeddings`: Local embedding generation with fastembed

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod builder;
pub mod embeddings;
pub mod lifecycle;
pub mod loom;
pub mod memory;
pub mod signature;
pub mod storage;
pub mod weaver;
pub mod worker;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Memory types
pub use memory::{
    BoxMemory, BoxUpdate, LinkType, LinkedBox, MemboxStats, MemoryBox, MemoryBoxItem, MemoryRef,
    MemoryType, PendingMemory, SourceRecord, TraceLink,
};

// Pipeline
pub use builder::{AddMemoryResult, BoxDecision, BuilderConfig, MemboxBuilder};
pub use loom::{Continuation, LoomConfig, MatchMethod, TopicLoom};
pub use signature::{SignatureExtractor, TopicSignature};
pub use weaver::{TraceWeaver, WeaverConfig};
pub use worker::{parse_time_span, run_worker, RunStats, TimeSpanError, WorkerConfig};

// Storage layer
pub use storage::{BoxStore, Result, Storage, StorageError};

// Embeddings
pub use embeddings::{CachedEmbedder, Embedder, Embedding, EmbeddingError};

#[cfg(feature = "embeddings")]
pub use embeddings::EmbeddingService;

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        AddMemoryResult, BoxDecision, BoxStore, BuilderConfig, Embedder, Embedding, MemboxBuilder,
        MemoryBox, MemoryType, Result, Storage, StorageError, TraceLink, WorkerConfig,
    };

    #[cfg(feature = "embeddings")]
    pub use crate::EmbeddingService;
}
