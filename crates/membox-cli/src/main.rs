//! Membox CLI
//!
//! Batch worker and inspection commands for the memory box store.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use membox_core::storage::BoxStore;
use membox_core::{
    parse_time_span, run_worker, MemboxBuilder, MemoryBox, MemoryType, SourceRecord, Storage,
    WorkerConfig,
};

/// Membox - topic-continuous memory boxes
#[derive(Parser)]
#[command(name = "membox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Group memories into topic boxes and link boxes that share events")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, env = "MEMBOX_DB")]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use local sentence embeddings for continuation detection
    #[cfg(feature = "embeddings")]
    #[arg(long, global = true)]
    embeddings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Box recent memories that are not in any box yet
    Worker {
        /// Time window to process (e.g. 30m, 1h, 24h, 7d)
        #[arg(long, default_value = "1h")]
        since: String,
        /// Max memories per type
        #[arg(long, default_value = "1000")]
        limit: usize,
        /// Memory types to process (comma-separated)
        #[arg(long, value_delimiter = ',', default_value = "debugging_fact,claude_memory,crystallization")]
        types: Vec<MemoryType>,
        /// Preview without processing
        #[arg(long)]
        dry_run: bool,
    },

    /// Record a memory and box it immediately
    Record {
        /// Memory content (debugging facts: "symptom: solution")
        content: String,
        /// Memory type
        #[arg(long = "type", default_value = "claude_memory")]
        memory_type: MemoryType,
    },

    /// Search boxes by topic text or keyword
    Search {
        /// Search query
        query: String,
        /// Minimum box score
        #[arg(long, default_value = "5.0")]
        min_score: f64,
        /// Max results
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a box and its memories in order
    Show {
        /// Box ID
        id: Uuid,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show boxes linked to a box
    Links {
        /// Box ID
        id: Uuid,
        /// Max results
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Show store statistics
    Stats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let storage = Arc::new(Storage::new(cli.db.clone())?);
    tracing::debug!("Using database {}", storage.path().display());

    #[cfg(feature = "embeddings")]
    let use_embeddings = cli.embeddings;
    #[cfg(not(feature = "embeddings"))]
    let use_embeddings = false;

    match cli.command {
        Commands::Worker {
            since,
            limit,
            types,
            dry_run,
        } => run_worker_command(storage, use_embeddings, &since, limit, types, dry_run),
        Commands::Record {
            content,
            memory_type,
        } => run_record(storage, use_embeddings, memory_type, content),
        Commands::Search {
            query,
            min_score,
            limit,
            json,
        } => run_search(&storage, &query, min_score, limit, json),
        Commands::Show { id, json } => run_show(&storage, id, json),
        Commands::Links { id, limit } => run_links(&storage, id, limit),
        Commands::Stats => run_stats(&storage),
    }
}

/// Logs go to stderr
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build(storage: Arc<Storage>, use_embeddings: bool) -> MemboxBuilder<Storage> {
    let builder = MemboxBuilder::new(storage);

    #[cfg(feature = "embeddings")]
    if use_embeddings {
        use membox_core::embeddings::{CachedEmbedder, EmbeddingService};

        let service = EmbeddingService::new();
        if let Err(e) = service.init() {
            tracing::warn!("Embedding model unavailable, using keyword overlap: {}", e);
            return builder;
        }
        return builder.with_embedder(Arc::new(CachedEmbedder::new(service)));
    }

    #[cfg(not(feature = "embeddings"))]
    let _ = use_embeddings;

    builder
}

fn run_worker_command(
    storage: Arc<Storage>,
    use_embeddings: bool,
    since: &str,
    limit: usize,
    memory_types: Vec<MemoryType>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let since = parse_time_span(since)?;
    let config = WorkerConfig {
        since,
        limit,
        memory_types,
        dry_run,
    };

    let mut builder = build(storage, use_embeddings);
    let stats = run_worker(&mut builder, &config)?;

    println!("{}", "=== Membox Worker ===".cyan().bold());
    println!("{}: {}", "Found".white().bold(), stats.found);
    println!("{}: {}", "Processed".white().bold(), stats.processed);
    println!("{}: {}", "Boxes Created".white().bold(), stats.boxes_created);
    println!("{}: {}", "Boxes Updated".white().bold(), stats.boxes_updated);

    if stats.errors > 0 {
        println!("{}: {}", "Errors".red().bold(), stats.errors);
        std::process::exit(1);
    }
    println!("{}: {}", "Errors".white().bold(), stats.errors);
    Ok(())
}

fn run_record(
    storage: Arc<Storage>,
    use_embeddings: bool,
    memory_type: MemoryType,
    content: String,
) -> anyhow::Result<()> {
    let record = SourceRecord::from_text(memory_type, content);
    let text = record.content().unwrap_or_default();
    let now = Utc::now();

    let memory = storage.record_source_memory(Uuid::new_v4(), &record, now)?;

    let mut builder = build(storage, use_embeddings);
    let result = builder.add_memory(memory.memory_type, memory.memory_id, &text, Some(now))?;

    println!(
        "{} {} {}",
        "Recorded".green().bold(),
        memory.memory_type,
        memory.memory_id
    );
    println!(
        "{} box {} ({}, {} memories)",
        result.decision.to_string().cyan().bold(),
        result.memory_box.id,
        result.memory_box.topic,
        result.memory_box.memory_count
    );
    for link in &result.links {
        println!(
            "  {} {} ({:.2})",
            "linked".dimmed(),
            link.other_end(result.memory_box.id),
            link.similarity_score
        );
    }
    Ok(())
}

fn run_search(
    storage: &Storage,
    query: &str,
    min_score: f64,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let boxes = storage.search_boxes(query, min_score, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&boxes)?);
        return Ok(());
    }

    if boxes.is_empty() {
        println!("{}", "No boxes found.".dimmed());
        return Ok(());
    }
    for memory_box in &boxes {
        print_box_line(memory_box);
    }
    Ok(())
}

fn run_show(storage: &Storage, id: Uuid, json: bool) -> anyhow::Result<()> {
    let memory_box = storage
        .get_box(id)?
        .ok_or_else(|| anyhow::anyhow!("Box not found: {}", id))?;
    let memories = storage.get_box_memories(id)?;

    if json {
        let value = serde_json::json!({
            "box": memory_box,
            "memories": memories,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", format!("=== {} ===", memory_box.topic).cyan().bold());
    println!("{}: {}", "ID".white().bold(), memory_box.id);
    println!("{}: {}", "Memories".white().bold(), memory_box.memory_count);
    println!("{}: {:.1}", "Score".white().bold(), memory_box.score);
    println!(
        "{}: {} .. {}",
        "Span".white().bold(),
        memory_box.start_time.format("%Y-%m-%d %H:%M:%S"),
        memory_box.end_time.format("%Y-%m-%d %H:%M:%S")
    );
    if !memory_box.is_active {
        println!("{}", "(inactive)".yellow());
    }
    println!("{}: {}", "Keywords".white().bold(), memory_box.keywords.join(", "));
    if !memory_box.events.is_empty() {
        println!("{}:", "Events".white().bold());
        for event in &memory_box.events {
            println!("  - {}", event);
        }
    }
    if let Some(summary) = &memory_box.summary {
        println!("{}: {}", "Summary".white().bold(), summary);
    }

    println!();
    for memory in &memories {
        println!(
            "{} [{}] {}",
            format!("{:>3}.", memory.position).dimmed(),
            memory.memory_type.to_string().yellow(),
            memory.content
        );
    }
    Ok(())
}

fn run_links(storage: &Storage, id: Uuid, limit: usize) -> anyhow::Result<()> {
    let linked = storage.get_linked_boxes(id, limit)?;

    if linked.is_empty() {
        println!("{}", "No linked boxes.".dimmed());
        return Ok(());
    }
    for link in &linked {
        println!(
            "{} {}",
            format!("{:.2}", link.similarity_score).green(),
            link.memory_box.topic.white().bold()
        );
        println!("     {}", link.memory_box.id.to_string().dimmed());
        for event in &link.linking_events {
            println!("     - {}", event);
        }
    }
    Ok(())
}

fn run_stats(storage: &Storage) -> anyhow::Result<()> {
    let stats = storage.get_stats()?;

    println!("{}", "=== Membox Statistics ===".cyan().bold());
    println!();
    println!("{}: {}", "Total Boxes".white().bold(), stats.total_boxes);
    println!("{}: {}", "Active Boxes".white().bold(), stats.active_boxes);
    println!("{}: {}", "Boxed Memories".white().bold(), stats.total_items);
    println!("{}: {}", "Trace Links".white().bold(), stats.total_links);
    println!("{}: {:.1}", "Average Box Size".white().bold(), stats.average_box_size);
    println!("{}: {}", "Largest Box".white().bold(), stats.largest_box_size);

    if let Some(oldest) = stats.oldest_memory {
        println!("{}: {}", "Oldest Memory".white().bold(), oldest.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(newest) = stats.newest_memory {
        println!("{}: {}", "Newest Memory".white().bold(), newest.format("%Y-%m-%d %H:%M:%S"));
    }
    Ok(())
}

fn print_box_line(memory_box: &MemoryBox) {
    println!(
        "{} {} {}",
        format!("{:>5.1}", memory_box.score).green(),
        memory_box.topic.white().bold(),
        format!("({} memories)", memory_box.memory_count).dimmed()
    );
    println!("      {}", memory_box.id.to_string().dimmed());
    if !memory_box.keywords.is_empty() {
        println!("      {}", memory_box.keywords.join(", "));
    }
}
