//! Test Data Factory
//!
//! Provides utilities for generating realistic memory streams:
//! - Topic threads whose memories share vocabulary keywords
//! - Memories that share event phrases across topics
//! - Pre-built scenarios for common test cases

use chrono::{DateTime, Duration, Utc};

/// Factory for creating test data
pub struct TestDataFactory;

/// The two-sentence pool/timeout scenario
///
/// The second sentence has no vocabulary keywords, so it can only continue
/// the first box through embeddings.
pub const POOL_TIMEOUT_PAIR: [&str; 2] = [
    "Fixed the database timeout by increasing pool size.",
    "Also fixed another timeout in the connection pool.",
];

impl TestDataFactory {
    /// Memories about one topic, each carrying the same keywords
    pub fn topic_thread(keywords: &[&str], count: usize) -> Vec<String> {
        let joined = keywords.join(" ");
        (0..count)
            .map(|i| format!("Note {i} on {joined}\nStill looking at {joined} today."))
            .collect()
    }

    /// A memory with its own topic line and the given action sentences
    ///
    /// Used to make boxes on unrelated keywords that share event phrases.
    pub fn with_events(topic: &str, actions: &[&str]) -> String {
        format!("{}\n{}", topic, actions.join(" "))
    }

    /// `count` timestamps spaced `step` apart, ending `ago` before now
    pub fn timeline(count: usize, step: Duration, ago: Duration) -> Vec<DateTime<Utc>> {
        let end = Utc::now() - ago;
        (0..count)
            .map(|i| end - step * (count - 1 - i) as i32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_is_ascending() {
        let times = TestDataFactory::timeline(4, Duration::minutes(5), Duration::minutes(1));
        assert_eq!(times.len(), 4);
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(times[1] - times[0], Duration::minutes(5));
    }
}
