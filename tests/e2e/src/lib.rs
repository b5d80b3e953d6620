//! End-to-end test support for Membox
//!
//! - [`harness`]: isolated databases and builders
//! - [`mocks`]: deterministic embedder, failure-injecting store, test data

pub mod harness;
pub mod mocks;

pub use harness::TestDatabaseManager;
pub use mocks::{FlakyStore, TestDataFactory, TokenEmbedder};
