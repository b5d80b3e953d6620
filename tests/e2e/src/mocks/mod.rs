//! Test doubles and data factories

mod embedder;
mod fixtures;
mod flaky_store;

pub use embedder::{TokenEmbedder, TOKEN_DIMENSIONS};
pub use fixtures::{TestDataFactory, POOL_TIMEOUT_PAIR};
pub use flaky_store::FlakyStore;
