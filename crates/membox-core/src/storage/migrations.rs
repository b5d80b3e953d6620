//! Database Migrations
//!
//! Schema migration definitions for the storage layer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Memory boxes, box items, trace links and box search index",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Source memory tables",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Box schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS memory_boxes (
    id TEXT PRIMARY KEY,
    topic TEXT NOT NULL,
    keywords TEXT NOT NULL DEFAULT '[]',
    events TEXT NOT NULL DEFAULT '[]',
    summary TEXT,
    memory_count INTEGER NOT NULL DEFAULT 1,
    score REAL NOT NULL DEFAULT 10.0,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_boxes_updated ON memory_boxes(updated_at);
CREATE INDEX IF NOT EXISTS idx_boxes_score ON memory_boxes(score);
CREATE INDEX IF NOT EXISTS idx_boxes_active ON memory_boxes(is_active);

CREATE TABLE IF NOT EXISTS memory_box_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    box_id TEXT NOT NULL REFERENCES memory_boxes(id) ON DELETE CASCADE,
    memory_type TEXT NOT NULL,
    memory_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    added_at TEXT NOT NULL,
    UNIQUE(box_id, position),
    UNIQUE(box_id, memory_type, memory_id)
);

CREATE INDEX IF NOT EXISTS idx_box_items_memory ON memory_box_items(memory_type, memory_id);

-- One row per unordered pair, source < target
CREATE TABLE IF NOT EXISTS trace_links (
    id TEXT PRIMARY KEY,
    source_box_id TEXT NOT NULL REFERENCES memory_boxes(id) ON DELETE CASCADE,
    target_box_id TEXT NOT NULL REFERENCES memory_boxes(id) ON DELETE CASCADE,
    link_type TEXT NOT NULL DEFAULT 'event_similarity',
    similarity_score REAL NOT NULL,
    linking_events TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(source_box_id, target_box_id),
    CHECK (source_box_id < target_box_id)
);

CREATE INDEX IF NOT EXISTS idx_links_target ON trace_links(target_box_id);

-- FTS5 index over topic and keywords
CREATE VIRTUAL TABLE IF NOT EXISTS memory_boxes_fts USING fts5(
    id UNINDEXED,
    topic,
    keywords,
    content='memory_boxes',
    content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS memory_boxes_ai AFTER INSERT ON memory_boxes BEGIN
    INSERT INTO memory_boxes_fts(rowid, id, topic, keywords)
    VALUES (NEW.rowid, NEW.id, NEW.topic, NEW.keywords);
END;

CREATE TRIGGER IF NOT EXISTS memory_boxes_ad AFTER DELETE ON memory_boxes BEGIN
    INSERT INTO memory_boxes_fts(memory_boxes_fts, rowid, id, topic, keywords)
    VALUES ('delete', OLD.rowid, OLD.id, OLD.topic, OLD.keywords);
END;

CREATE TRIGGER IF NOT EXISTS memory_boxes_au AFTER UPDATE ON memory_boxes BEGIN
    INSERT INTO memory_boxes_fts(memory_boxes_fts, rowid, id, topic, keywords)
    VALUES ('delete', OLD.rowid, OLD.id, OLD.topic, OLD.keywords);
    INSERT INTO memory_boxes_fts(rowid, id, topic, keywords)
    VALUES (NEW.rowid, NEW.id, NEW.topic, NEW.keywords);
END;

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Source memory tables
const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS debugging_facts (
    fact_id TEXT PRIMARY KEY,
    symptom TEXT NOT NULL,
    solution TEXT NOT NULL DEFAULT '',
    first_seen TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_facts_first_seen ON debugging_facts(first_seen);

CREATE TABLE IF NOT EXISTS claude_memories (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_claude_memories_created ON claude_memories(created_at);

CREATE TABLE IF NOT EXISTS crystallization_events (
    id TEXT PRIMARY KEY,
    understanding_as_crystallized TEXT,
    resolving_content TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crystallizations_created ON crystallization_events(created_at);

CREATE TABLE IF NOT EXISTS session_narratives (
    id TEXT PRIMARY KEY,
    narrative_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_narratives_created ON session_narratives(created_at);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (2, datetime('now'));
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
