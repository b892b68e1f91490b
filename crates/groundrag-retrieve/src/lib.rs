//! Query-time retrieval over a [`Corpus`].
//!
//! The strategy is chosen before dispatch: vector search when the corpus has
//! a populated vector index and the embedding gateway reports itself
//! available, keyword overlap otherwise. A vector search that fails at
//! runtime is logged and answered by the keyword path instead.
use tracing::{debug, warn};

use groundrag_core::traits::EmbeddingGateway;
use groundrag_core::types::{RetrievedChunk, SearchHit, SourceKind};
use groundrag_core::{Error, Result};
use groundrag_vector::{similarity, VectorIndex};

mod corpus;

pub use corpus::Corpus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    Vector,
    Keyword,
}

/// Ranked chunks plus the strategy that actually produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    pub hits: Vec<RetrievedChunk>,
    pub strategy: RetrievalStrategy,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool { self.hits.is_empty() }
}

pub struct Retriever<'a> {
    corpus: &'a Corpus,
    embedder: Option<&'a dyn EmbeddingGateway>,
}

impl<'a> Retriever<'a> {
    pub fn new(corpus: &'a Corpus, embedder: Option<&'a dyn EmbeddingGateway>) -> Self {
        Self { corpus, embedder }
    }

    pub fn select_strategy(&self) -> RetrievalStrategy {
        match (self.corpus.vector_index(), self.embedder) {
            (Some(_), Some(gateway)) if gateway.is_available() => RetrievalStrategy::Vector,
            _ => RetrievalStrategy::Keyword,
        }
    }

    /// Never fails: vector errors degrade to keyword retrieval for this call.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Retrieval {
        let strategy = self.select_strategy();
        if top_k == 0 {
            return Retrieval { hits: Vec::new(), strategy };
        }
        debug!(?strategy, top_k, "retrieving");
        if let (RetrievalStrategy::Vector, Some(index), Some(gateway)) = (strategy, self.corpus.vector_index(), self.embedder) {
            match vector_search(index, gateway, query, top_k) {
                Ok(hits) => return self.resolve(&hits, strategy),
                Err(e) => warn!("vector retrieval failed, using keyword overlap: {e}"),
            }
        }
        let hits = self.corpus.keyword_index().search(query, top_k);
        self.resolve(&hits, RetrievalStrategy::Keyword)
    }

    fn resolve(&self, hits: &[SearchHit], strategy: RetrievalStrategy) -> Retrieval {
        let chunks = self.corpus.chunks();
        let hits = hits
            .iter()
            .filter_map(|hit| {
                chunks.get(hit.position).map(|chunk| RetrievedChunk {
                    chunk_id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    score: hit.score.clamp(0.0, 1.0),
                })
            })
            .collect();
        Retrieval { hits, strategy }
    }
}

fn vector_search(index: &VectorIndex, gateway: &dyn EmbeddingGateway, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
    let query_embedding = gateway
        .embed_batch(&[query.to_string()])?
        .into_iter()
        .next()
        .ok_or_else(|| Error::IndexUnavailable(format!("{} returned no query embedding", gateway.embedder_id())))?;
    let hits = index
        .search(&query_embedding, top_k)?
        .into_iter()
        .map(|(position, distance)| SearchHit { position, score: similarity(distance), source: SourceKind::Vector })
        .collect();
    Ok(hits)
}
