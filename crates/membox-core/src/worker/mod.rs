//! Batch Worker
//!
//! Sweeps recent source memories that are not yet in any box and feeds
//! them through a [`MemboxBuilder`]. Intended for cron-style runs.
//!
//! Memories are processed oldest first so box time spans grow forward.
//! A failing record is logged and counted; the run carries on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::builder::{BoxDecision, MemboxBuilder};
use crate::memory::MemoryType;
use crate::storage::{BoxStore, Result};

/// Records shown by a dry run
pub const DRY_RUN_PREVIEW: usize = 10;

/// Progress is logged every this many records
pub const PROGRESS_INTERVAL: usize = 10;

/// Characters of content shown per previewed record
const PREVIEW_CHARS: usize = 60;

// ============================================================================
// TIME SPANS
// ============================================================================

/// Error parsing a `--since` style time span
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeSpanError {
    /// The amount is not a non-negative integer
    #[error("Invalid time span amount in '{0}'")]
    InvalidAmount(String),
    /// The unit is not one of h/d/m
    #[error("Unknown time unit '{0}' (use h/d/m)")]
    UnknownUnit(String),
}

/// Parse a time span such as `30m`, `1h`, `24h` or `7d`
///
/// An empty string means one hour.
pub fn parse_time_span(span: &str) -> std::result::Result<Duration, TimeSpanError> {
    let span = span.trim();
    let Some(unit) = span.chars().last() else {
        return Ok(Duration::hours(1));
    };

    let amount = &span[..span.len() - unit.len_utf8()];
    let value: i64 = amount
        .parse()
        .ok()
        .filter(|v: &i64| *v >= 0)
        .ok_or_else(|| TimeSpanError::InvalidAmount(span.to_string()))?;

    let duration = match unit.to_ascii_lowercase() {
        'h' => Duration::try_hours(value),
        'd' => Duration::try_days(value),
        'm' => Duration::try_minutes(value),
        other => return Err(TimeSpanError::UnknownUnit(other.to_string())),
    };
    duration.ok_or_else(|| TimeSpanError::InvalidAmount(span.to_string()))
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for a worker run
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How far back to look
    pub since: Duration,
    /// Maximum memories fetched per type
    pub limit: usize,
    /// Memory types to process
    pub memory_types: Vec<MemoryType>,
    /// Preview only, change nothing
    pub dry_run: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            since: Duration::hours(1),
            limit: 1000,
            memory_types: MemoryType::DEFAULT_WORKER_TYPES.to_vec(),
            dry_run: false,
        }
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Unboxed memories found
    pub found: usize,
    /// Memories added successfully
    pub processed: usize,
    /// New boxes opened
    pub boxes_created: usize,
    /// Merges into existing boxes
    pub boxes_updated: usize,
    /// Memories that failed
    pub errors: usize,
}

// ============================================================================
// RUN
// ============================================================================

/// Box every unboxed memory in the configured window
///
/// Only the initial fetch can fail the run; per-memory failures are counted
/// in [`RunStats::errors`].
pub fn run_worker<S: BoxStore + ?Sized>(
    builder: &mut MemboxBuilder<S>,
    config: &WorkerConfig,
) -> Result<RunStats> {
    tracing::info!(
        "Processing memories from the last {} minutes (types: {:?}, dry run: {})",
        config.since.num_minutes(),
        config.memory_types,
        config.dry_run
    );

    // Spans reaching past the representable range cover everything
    let cutoff = Utc::now()
        .checked_sub_signed(config.since)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut memories = builder
        .store()
        .pending_memories(cutoff, config.limit, &config.memory_types)?;

    let mut stats = RunStats {
        found: memories.len(),
        ..Default::default()
    };

    if memories.is_empty() {
        tracing::info!("No new memories to process");
        return Ok(stats);
    }
    tracing::info!("Found {} unboxed memories", memories.len());

    memories.sort_by_key(|m| m.created_at);

    if config.dry_run {
        tracing::info!("Dry run, would process:");
        for memory in memories.iter().take(DRY_RUN_PREVIEW) {
            let preview: String = memory.content.chars().take(PREVIEW_CHARS).collect();
            tracing::info!("  [{}] {}...", memory.memory_type, preview);
        }
        if memories.len() > DRY_RUN_PREVIEW {
            tracing::info!("  ... and {} more", memories.len() - DRY_RUN_PREVIEW);
        }
        return Ok(stats);
    }

    for memory in &memories {
        match builder.add_memory(
            memory.memory_type,
            memory.memory_id,
            &memory.content,
            Some(memory.created_at),
        ) {
            Ok(result) => {
                stats.processed += 1;
                match result.decision {
                    BoxDecision::Created => stats.boxes_created += 1,
                    BoxDecision::Merged => stats.boxes_updated += 1,
                }
                if stats.processed % PROGRESS_INTERVAL == 0 {
                    tracing::info!(
                        "Progress: {}/{} memories processed",
                        stats.processed,
                        stats.found
                    );
                }
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(
                    "Error processing {} {}: {}",
                    memory.memory_type,
                    memory.memory_id,
                    e
                );
            }
        }
    }

    tracing::info!(
        "Run complete: {} processed, {} boxes created, {} boxes updated, {} errors",
        stats.processed,
        stats.boxes_created,
        stats.boxes_updated,
        stats.errors
    );
    Ok(stats)
}
