use std::collections::HashSet;
use tracing::debug;

use groundrag_core::tokens::{overlap_ratio, token_set};
use groundrag_core::types::{Chunk, SearchHit, SourceKind};

/// Token sets of every chunk, positionally aligned with the chunk sequence.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    token_sets: Vec<HashSet<String>>,
}

impl KeywordIndex {
    pub fn new(chunks: &[Chunk]) -> Self {
        Self { token_sets: chunks.iter().map(|c| token_set(&c.text)).collect() }
    }

    pub fn len(&self) -> usize { self.token_sets.len() }

    pub fn is_empty(&self) -> bool { self.token_sets.is_empty() }

    /// Relevance is `|query ∩ chunk| / |query|` over unique lowercase tokens.
    /// Zero-relevance chunks are dropped; ties keep chunk order.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        if top_k == 0 { return Vec::new(); }
        let query_tokens = token_set(query);
        if query_tokens.is_empty() { return Vec::new(); }
        let mut hits: Vec<SearchHit> = self
            .token_sets
            .iter()
            .enumerate()
            .filter_map(|(position, tokens)| {
                let score = overlap_ratio(&query_tokens, tokens);
                (score > 0.0).then_some(SearchHit { position, score, source: SourceKind::Keyword })
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        debug!(query_tokens = query_tokens.len(), hits = hits.len(), "keyword search");
        hits
    }
}
