//! Whitespace tokenizer shared by keyword retrieval and grounding.

use std::collections::HashSet;

/// Lowercases `text` and splits it on whitespace into a set of unique tokens.
pub fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// `|query ∩ other| / |query|`, or 0 when `query` is empty.
pub fn overlap_ratio(query: &HashSet<String>, other: &HashSet<String>) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    let shared = query.iter().filter(|t| other.contains(*t)).count();
    shared as f32 / query.len() as f32
}
