//! Domain types shared by the chunker, the indices and the orchestrator.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A loaded source document. `id` is its position in load order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: usize,
    pub source: String,
    pub text: String,
}

/// A window of a source document that is independently retrieved.
///
/// - `id`: `"<doc_id>:<chunk_index>"`
/// - `doc_id`: load-order identifier of the parent [`Document`]
/// - `source`: path of the parent document
/// - `chunk_index`: position within the parent document
/// - `offset`: character offset of the first character in the parent text
/// - `text`: the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: usize,
    pub source: String,
    pub chunk_index: usize,
    pub offset: usize,
    pub text: String,
}

impl Chunk {
    pub fn chunk_id(doc_id: usize, chunk_index: usize) -> ChunkId {
        format!("{doc_id}:{chunk_index}")
    }

    /// Number of characters covered by this chunk.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Indicates which retrieval path produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Keyword,
}

/// The minimal surface returned by both indices.
///
/// `position` is the chunk's index in the corpus sequence. `score` is a
/// relevance in [0, 1], higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub position: usize,
    pub score: f32,
    pub source: SourceKind,
}

/// One entry of a retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: ChunkId,
    pub text: String,
    pub score: f32,
}

/// Output of the orchestrator's `answer` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer_text: String,
    pub cited_chunk_ids: Vec<ChunkId>,
    pub average_relevance: f32,
    pub grounding_score: f32,
}
