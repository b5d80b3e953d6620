//! Set helpers over ordered string collections.
//!
//! Keyword and event sets are stored as ordered lists. These helpers give
//! them set semantics while keeping insertion order, so capping is
//! deterministic: existing entries survive, newcomers fill remaining slots.

use std::collections::HashSet;

/// Order-preserving union of `current` and `incoming`, truncated to `cap`
pub fn union_capped(current: &[String], incoming: &[String], cap: usize) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(current.len() + incoming.len());
    let mut merged = Vec::with_capacity(cap.min(current.len() + incoming.len()));

    for item in current.iter().chain(incoming.iter()) {
        if merged.len() >= cap {
            break;
        }
        if seen.insert(item.as_str()) {
            merged.push(item.clone());
        }
    }

    merged
}

/// Jaccard similarity |A ∩ B| / |A ∪ B| of two string sets
///
/// Two empty sets score 0.0.
pub fn jaccard_similarity(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}
