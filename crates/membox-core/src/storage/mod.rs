//! Storage Module
//!
//! SQLite-based storage layer with:
//! - Box, item and trace link tables
//! - FTS5 search over box topics and keywords
//! - Source memory tables read by the batch worker
//! - The [`BoxStore`] trait the engine is written against

mod migrations;
mod sqlite;
mod store;

pub use migrations::MIGRATIONS;
pub use sqlite::{sanitize_fts5_query, Result, Storage, StorageError, DEFAULT_DB_FILE};
pub use store::BoxStore;
