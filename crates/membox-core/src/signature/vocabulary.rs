//! Controlled vocabulary and event trigger patterns.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Domain terms recognized as keywords
pub const TECH_KEYWORDS: &[&str] = &[
    "python", "javascript", "typescript", "rust", "go", "java", "sql",
    "api", "database", "server", "client", "frontend", "backend",
    "bug", "error", "fix", "refactor", "test", "deploy", "build",
    "memory", "performance", "security", "authentication", "cache",
    "async", "sync", "parallel", "concurrent", "thread", "process",
    "git", "commit", "branch", "merge", "pull", "push", "rebase",
    "mcp", "hook", "plugin", "extension", "tool", "agent", "llm",
    "pheromone", "crystallization", "embedding", "vector", "search",
];

/// Event trigger patterns, in priority order
///
/// Each pairs the forms of an action verb with the rest of the clause up to
/// sentence-ending punctuation or a newline. Order matters: events are
/// collected pattern by pattern and the list is cut at the cap.
pub const EVENT_PATTERNS: &[&str] = &[
    r"(?i)(?:fixed|fix|resolved|resolve)\s+([^.!?\n]+)",
    r"(?i)(?:implemented|implement|added|add)\s+([^.!?\n]+)",
    r"(?i)(?:created|create|built|build)\s+([^.!?\n]+)",
    r"(?i)(?:updated|update|changed|change)\s+([^.!?\n]+)",
    r"(?i)(?:deleted|delete|removed|remove)\s+([^.!?\n]+)",
    r"(?i)(?:discovered|discover|found|find)\s+([^.!?\n]+)",
    r"(?i)(?:configured|configure|setup|set up)\s+([^.!?\n]+)",
    r"(?i)(?:debugged|debug|diagnosed|diagnose)\s+([^.!?\n]+)",
];

pub(crate) static VOCABULARY: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| TECH_KEYWORDS.iter().copied().collect());

pub(crate) static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]+\b").expect("word pattern is valid"));

pub(crate) static EVENT_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    EVENT_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("event pattern is valid"))
        .collect()
});

/// Whether `word` (lower-case) is in the controlled vocabulary
pub fn is_keyword(word: &str) -> bool {
    VOCABULARY.contains(word)
}
