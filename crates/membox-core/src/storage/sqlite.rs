//! SQLite Storage Implementation
//!
//! Boxes, items and links live in one database together with the source
//! memory tables. Keyword and event sets are stored as JSON arrays and
//! queried with `json_each`.

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::store::BoxStore;
use crate::memory::{
    BoxMemory, BoxUpdate, LinkType, LinkedBox, MemboxStats, MemoryBox, MemoryBoxItem, MemoryRef,
    MemoryType, PendingMemory, SourceRecord, TraceLink,
};

/// File name of the database in the platform data directory
pub const DEFAULT_DB_FILE: &str = "membox.db";

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Box not found
    #[error("Box not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Malformed or inconsistent ID
    #[error("Invalid ID: {0}")]
    InvalidId(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// JSON column encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite-backed box store
///
/// Uses separate reader/writer connections for interior mutability.
/// All methods take `&self`, making Storage `Send + Sync` so callers can
/// share it as `Arc<Storage>`.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("path", &self.path).finish()
    }
}

impl Storage {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("MEMBOX_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Default database location in the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "membox", "core").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        Ok(proj_dirs.data_dir().join(DEFAULT_DB_FILE))
    }

    /// Open (or create) the store, applying pending migrations
    ///
    /// `None` uses [`Storage::default_path`].
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Migrations run on the writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    fn reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    // ========================================================================
    // ROW CONVERSION
    // ========================================================================

    fn conversion_error(message: String) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
        )
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                Self::conversion_error(format!(
                    "Invalid {} timestamp '{}': {}",
                    field_name, value, e
                ))
            })
    }

    fn parse_uuid(value: &str, field_name: &str) -> rusqlite::Result<Uuid> {
        Uuid::parse_str(value)
            .map_err(|e| Self::conversion_error(format!("Invalid {} '{}': {}", field_name, value, e)))
    }

    fn parse_memory_type(value: &str) -> rusqlite::Result<MemoryType> {
        value.parse().map_err(Self::conversion_error)
    }

    fn parse_string_set(value: &str, field_name: &str) -> rusqlite::Result<Vec<String>> {
        serde_json::from_str(value).map_err(|e| {
            Self::conversion_error(format!("Invalid {} list '{}': {}", field_name, value, e))
        })
    }

    /// Convert a row to MemoryBox
    fn row_to_box(row: &rusqlite::Row) -> rusqlite::Result<MemoryBox> {
        let id: String = row.get("id")?;
        let keywords: String = row.get("keywords")?;
        let events: String = row.get("events")?;
        let start_time: String = row.get("start_time")?;
        let end_time: String = row.get("end_time")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(MemoryBox {
            id: Self::parse_uuid(&id, "box id")?,
            topic: row.get("topic")?,
            keywords: Self::parse_string_set(&keywords, "keywords")?,
            events: Self::parse_string_set(&events, "events")?,
            summary: row.get("summary")?,
            memory_count: row.get("memory_count")?,
            score: row.get("score")?,
            start_time: Self::parse_timestamp(&start_time, "start_time")?,
            end_time: Self::parse_timestamp(&end_time, "end_time")?,
            is_active: row.get("is_active")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            updated_at: Self::parse_timestamp(&updated_at, "updated_at")?,
        })
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<MemoryBoxItem> {
        let box_id: String = row.get("box_id")?;
        let memory_type: String = row.get("memory_type")?;
        let memory_id: String = row.get("memory_id")?;

        Ok(MemoryBoxItem {
            box_id: Self::parse_uuid(&box_id, "box id")?,
            memory_type: Self::parse_memory_type(&memory_type)?,
            memory_id: Self::parse_uuid(&memory_id, "memory id")?,
            position: row.get("position")?,
        })
    }

    fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<TraceLink> {
        let id: String = row.get("id")?;
        let source: String = row.get("source_box_id")?;
        let target: String = row.get("target_box_id")?;
        let link_type: String = row.get("link_type")?;
        let linking_events: String = row.get("linking_events")?;

        Ok(TraceLink {
            id: Self::parse_uuid(&id, "link id")?,
            source_box_id: Self::parse_uuid(&source, "source box id")?,
            target_box_id: Self::parse_uuid(&target, "target box id")?,
            link_type: link_type
                .parse::<LinkType>()
                .map_err(Self::conversion_error)?,
            similarity_score: row.get("similarity_score")?,
            linking_events: Self::parse_string_set(&linking_events, "linking_events")?,
        })
    }

    // ========================================================================
    // WRITE HELPERS
    // ========================================================================

    fn insert_item(
        conn: &Connection,
        box_id: Uuid,
        memory: MemoryRef,
        position: i64,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO memory_box_items (box_id, memory_type, memory_id, position, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                box_id.to_string(),
                memory.memory_type.as_str(),
                memory.memory_id.to_string(),
                position,
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    fn next_position_in(conn: &Connection, box_id: Uuid) -> rusqlite::Result<i64> {
        conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM memory_box_items WHERE box_id = ?1",
            params![box_id.to_string()],
            |row| row.get(0),
        )
    }

    fn collect_boxes(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<MemoryBox>> {
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, Self::row_to_box)?;

        let mut boxes = Vec::new();
        for row in rows {
            boxes.push(row?);
        }
        Ok(boxes)
    }

    // ========================================================================
    // SOURCE MEMORIES
    // ========================================================================

    /// Write a memory into its source table
    pub fn record_source_memory(
        &self,
        id: Uuid,
        record: &SourceRecord,
        created_at: DateTime<Utc>,
    ) -> Result<MemoryRef> {
        let writer = self.writer()?;
        let id_str = id.to_string();
        let created = format_timestamp(&created_at);

        match record {
            SourceRecord::DebuggingFact { symptom, solution } => writer.execute(
                "INSERT INTO debugging_facts (fact_id, symptom, solution, first_seen)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id_str, symptom, solution, created],
            )?,
            SourceRecord::ClaudeMemory { content } => writer.execute(
                "INSERT INTO claude_memories (id, content, created_at) VALUES (?1, ?2, ?3)",
                params![id_str, content, created],
            )?,
            SourceRecord::Crystallization {
                understanding,
                resolving_content,
            } => writer.execute(
                "INSERT INTO crystallization_events
                    (id, understanding_as_crystallized, resolving_content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id_str, understanding, resolving_content, created],
            )?,
            SourceRecord::Narrative { text } => writer.execute(
                "INSERT INTO session_narratives (id, narrative_text, created_at) VALUES (?1, ?2, ?3)",
                params![id_str, text, created],
            )?,
        };

        Ok(MemoryRef::new(record.memory_type(), id))
    }

    /// Text content of a source memory
    pub fn get_memory_content(&self, memory: MemoryRef) -> Result<Option<String>> {
        let reader = self.reader()?;
        Self::memory_content_in(&reader, memory)
    }

    fn memory_content_in(conn: &Connection, memory: MemoryRef) -> Result<Option<String>> {
        let source = memory.memory_type.source();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            source.content_expr, source.table, source.id_column
        );
        let content: Option<Option<String>> = conn
            .query_row(&sql, params![memory.memory_id.to_string()], |row| row.get(0))
            .optional()?;
        Ok(content.flatten())
    }

    // ========================================================================
    // RETRIEVAL
    // ========================================================================

    /// Items of a box in position order
    pub fn get_box_items(&self, box_id: Uuid) -> Result<Vec<MemoryBoxItem>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached(
            "SELECT box_id, memory_type, memory_id, position FROM memory_box_items
             WHERE box_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![box_id.to_string()], Self::row_to_item)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Items of a box with their content, in position order
    ///
    /// Items whose source row no longer exists are skipped.
    pub fn get_box_memories(&self, box_id: Uuid) -> Result<Vec<BoxMemory>> {
        let items = self.get_box_items(box_id)?;
        let reader = self.reader()?;

        let mut memories = Vec::with_capacity(items.len());
        for item in items {
            let memory = MemoryRef::new(item.memory_type, item.memory_id);
            match Self::memory_content_in(&reader, memory)? {
                Some(content) => memories.push(BoxMemory {
                    memory_type: item.memory_type,
                    memory_id: item.memory_id,
                    position: item.position,
                    content,
                }),
                None => tracing::debug!(
                    "Skipping {} {} in box {}: source row missing",
                    item.memory_type,
                    item.memory_id,
                    box_id
                ),
            }
        }
        Ok(memories)
    }

    /// Links touching a box, strongest first
    pub fn get_links(&self, box_id: Uuid) -> Result<Vec<TraceLink>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached(
            "SELECT * FROM trace_links
             WHERE source_box_id = ?1 OR target_box_id = ?1
             ORDER BY similarity_score DESC",
        )?;
        let rows = stmt.query_map(params![box_id.to_string()], Self::row_to_link)?;

        let mut links = Vec::new();
        for row in rows {
            links.push(row?);
        }
        Ok(links)
    }

    /// Boxes linked to `box_id` in either direction, strongest first
    pub fn get_linked_boxes(&self, box_id: Uuid, limit: usize) -> Result<Vec<LinkedBox>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached(
            "SELECT b.*, l.similarity_score AS link_score, l.linking_events AS link_events
             FROM trace_links l
             JOIN memory_boxes b ON b.id = CASE
                 WHEN l.source_box_id = ?1 THEN l.target_box_id
                 ELSE l.source_box_id
             END
             WHERE l.source_box_id = ?1 OR l.target_box_id = ?1
             ORDER BY l.similarity_score DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![box_id.to_string(), limit as i64], |row| {
            let events: String = row.get("link_events")?;
            Ok(LinkedBox {
                memory_box: Self::row_to_box(row)?,
                similarity_score: row.get("link_score")?,
                linking_events: Self::parse_string_set(&events, "linking_events")?,
            })
        })?;

        let mut linked = Vec::new();
        for row in rows {
            linked.push(row?);
        }
        Ok(linked)
    }

    /// Set or clear a box's active flag
    pub fn set_box_active(&self, box_id: Uuid, active: bool) -> Result<()> {
        let writer = self.writer()?;
        let changed = writer.execute(
            "UPDATE memory_boxes SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active, format_timestamp(&Utc::now()), box_id.to_string()],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(box_id.to_string()));
        }
        Ok(())
    }

    /// Aggregate statistics
    pub fn get_stats(&self) -> Result<MemboxStats> {
        let reader = self.reader()?;

        let (total_boxes, active_boxes, average_box_size, largest_box_size, oldest, newest) =
            reader.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(is_active), 0),
                        COALESCE(AVG(memory_count), 0.0),
                        COALESCE(MAX(memory_count), 0),
                        MIN(start_time),
                        MAX(end_time)
                 FROM memory_boxes",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )?;

        let total_items: i64 =
            reader.query_row("SELECT COUNT(*) FROM memory_box_items", [], |row| row.get(0))?;
        let total_links: i64 =
            reader.query_row("SELECT COUNT(*) FROM trace_links", [], |row| row.get(0))?;

        let oldest_memory = oldest
            .map(|s| Self::parse_timestamp(&s, "start_time"))
            .transpose()?;
        let newest_memory = newest
            .map(|s| Self::parse_timestamp(&s, "end_time"))
            .transpose()?;

        Ok(MemboxStats {
            total_boxes,
            active_boxes,
            total_items,
            total_links,
            average_box_size,
            largest_box_size,
            oldest_memory,
            newest_memory,
        })
    }
}

// ============================================================================
// BOX STORE
// ============================================================================

impl BoxStore for Storage {
    fn get_box(&self, id: Uuid) -> Result<Option<MemoryBox>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached("SELECT * FROM memory_boxes WHERE id = ?1")?;
        let memory_box = stmt
            .query_row(params![id.to_string()], Self::row_to_box)
            .optional()?;
        Ok(memory_box)
    }

    fn create_box(&self, memory_box: &MemoryBox, memory: MemoryRef) -> Result<MemoryBox> {
        let keywords = serde_json::to_string(&memory_box.keywords)?;
        let events = serde_json::to_string(&memory_box.events)?;

        let mut writer = self.writer()?;
        let tx = writer.transaction()?;

        tx.execute(
            "INSERT INTO memory_boxes (
                id, topic, keywords, events, summary, memory_count, score,
                start_time, end_time, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                memory_box.id.to_string(),
                memory_box.topic,
                keywords,
                events,
                memory_box.summary,
                memory_box.memory_count,
                memory_box.score,
                format_timestamp(&memory_box.start_time),
                format_timestamp(&memory_box.end_time),
                memory_box.is_active,
                format_timestamp(&memory_box.created_at),
                format_timestamp(&memory_box.updated_at),
            ],
        )?;
        Self::insert_item(&tx, memory_box.id, memory, 1)?;

        tx.commit()?;
        Ok(memory_box.clone())
    }

    fn update_box(&self, id: Uuid, update: &BoxUpdate, memory: MemoryRef) -> Result<MemoryBox> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;

        let mut memory_box = tx
            .query_row(
                "SELECT * FROM memory_boxes WHERE id = ?1",
                params![id.to_string()],
                Self::row_to_box,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        memory_box.apply_update(update);
        let position = Self::next_position_in(&tx, id)?;

        tx.execute(
            "UPDATE memory_boxes SET
                keywords = ?1, events = ?2, memory_count = ?3, score = ?4,
                start_time = ?5, end_time = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                serde_json::to_string(&memory_box.keywords)?,
                serde_json::to_string(&memory_box.events)?,
                memory_box.memory_count,
                memory_box.score,
                format_timestamp(&memory_box.start_time),
                format_timestamp(&memory_box.end_time),
                format_timestamp(&memory_box.updated_at),
                id.to_string(),
            ],
        )?;
        Self::insert_item(&tx, id, memory, position)?;

        tx.commit()?;
        Ok(memory_box)
    }

    fn next_position(&self, box_id: Uuid) -> Result<i64> {
        let reader = self.reader()?;
        Ok(Self::next_position_in(&reader, box_id)?)
    }

    fn find_overlapping_boxes(
        &self,
        box_id: Uuid,
        events: &[String],
        limit: usize,
    ) -> Result<Vec<MemoryBox>> {
        if events.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let events_json = serde_json::to_string(events)?;
        let reader = self.reader()?;
        Self::collect_boxes(
            &reader,
            "SELECT b.* FROM memory_boxes b
             WHERE b.id != ?1
               AND b.is_active = 1
               AND EXISTS (
                   SELECT 1 FROM json_each(b.events) e
                   WHERE e.value IN (SELECT value FROM json_each(?2))
               )
             ORDER BY b.score DESC, b.updated_at DESC
             LIMIT ?3",
            params![box_id.to_string(), events_json, limit as i64],
        )
    }

    fn upsert_link(&self, link: &TraceLink) -> Result<()> {
        if link.source_box_id == link.target_box_id {
            return Err(StorageError::InvalidId(format!(
                "link endpoints must differ: {}",
                link.source_box_id
            )));
        }

        let link = link.canonical();
        let now = format_timestamp(&Utc::now());
        let writer = self.writer()?;

        writer.execute(
            "INSERT INTO trace_links (
                id, source_box_id, target_box_id, link_type,
                similarity_score, linking_events, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(source_box_id, target_box_id) DO UPDATE SET
                link_type = excluded.link_type,
                similarity_score = excluded.similarity_score,
                linking_events = excluded.linking_events,
                updated_at = excluded.updated_at",
            params![
                link.id.to_string(),
                link.source_box_id.to_string(),
                link.target_box_id.to_string(),
                link.link_type.as_str(),
                link.similarity_score,
                serde_json::to_string(&link.linking_events)?,
                now,
            ],
        )?;
        Ok(())
    }

    fn list_recent_active_boxes(&self, limit: usize) -> Result<Vec<MemoryBox>> {
        let reader = self.reader()?;
        Self::collect_boxes(
            &reader,
            "SELECT * FROM memory_boxes
             WHERE is_active = 1
             ORDER BY updated_at DESC, rowid DESC
             LIMIT ?1",
            params![limit as i64],
        )
    }

    fn search_boxes(&self, query: &str, min_score: f64, limit: usize) -> Result<Vec<MemoryBox>> {
        let keyword = query.trim().to_lowercase();
        if keyword.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let reader = self.reader()?;
        match sanitize_fts5_query(query) {
            Some(fts_query) => Self::collect_boxes(
                &reader,
                "SELECT b.* FROM memory_boxes b
                 LEFT JOIN (
                     SELECT id, rank FROM memory_boxes_fts WHERE memory_boxes_fts MATCH ?1
                 ) f ON f.id = b.id
                 WHERE b.is_active = 1
                   AND b.score >= ?2
                   AND (
                       f.id IS NOT NULL
                       OR EXISTS (SELECT 1 FROM json_each(b.keywords) k WHERE k.value = ?3)
                   )
                 ORDER BY COALESCE(f.rank, 0) ASC, b.score DESC
                 LIMIT ?4",
                params![fts_query, min_score, keyword, limit as i64],
            ),
            None => Self::collect_boxes(
                &reader,
                "SELECT b.* FROM memory_boxes b
                 WHERE b.is_active = 1
                   AND b.score >= ?1
                   AND EXISTS (SELECT 1 FROM json_each(b.keywords) k WHERE k.value = ?2)
                 ORDER BY b.score DESC
                 LIMIT ?3",
                params![min_score, keyword, limit as i64],
            ),
        }
    }

    fn pending_memories(
        &self,
        since: DateTime<Utc>,
        limit: usize,
        types: &[MemoryType],
    ) -> Result<Vec<PendingMemory>> {
        let cutoff = format_timestamp(&since.max(earliest_storable()));
        let reader = self.reader()?;

        let mut types = types.to_vec();
        types.sort();
        types.dedup();

        let mut pending = Vec::new();
        for memory_type in types {
            let source = memory_type.source();
            let sql = format!(
                "SELECT s.{id} AS memory_id, {content} AS content, s.{created} AS created_at
                 FROM {table} s
                 LEFT JOIN memory_box_items i
                   ON i.memory_type = ?1 AND i.memory_id = s.{id}
                 WHERE i.box_id IS NULL
                   AND s.{created} >= ?2
                   AND {content} IS NOT NULL
                 ORDER BY s.{created} DESC
                 LIMIT ?3",
                id = source.id_column,
                content = source.content_expr,
                created = source.created_column,
                table = source.table,
            );

            let mut stmt = reader.prepare(&sql)?;
            let rows = stmt.query_map(
                params![memory_type.as_str(), cutoff, limit as i64],
                |row| {
                    let memory_id: String = row.get("memory_id")?;
                    let created_at: String = row.get("created_at")?;
                    Ok(PendingMemory {
                        memory_type,
                        memory_id: Self::parse_uuid(&memory_id, "memory id")?,
                        content: row.get("content")?,
                        created_at: Self::parse_timestamp(&created_at, "created_at")?,
                    })
                },
            )?;

            for row in rows {
                pending.push(row?);
            }
        }

        Ok(pending)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// 0001-01-01T00:00:00Z, the earliest instant with a four-digit RFC3339 year
fn earliest_storable() -> DateTime<Utc> {
    DateTime::from_timestamp(-62_135_596_800, 0).unwrap_or_default()
}

/// Fixed-width RFC3339 so stored timestamps compare correctly as text
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Turn free text into an FTS5 query of quoted terms
///
/// Every alphanumeric run becomes a quoted term so FTS5 operators and
/// punctuation in user input cannot change the query's meaning. Returns
/// `None` when nothing searchable remains.
pub fn sanitize_fts5_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

// ============================================================================
// TESTS
// ============================================================================
