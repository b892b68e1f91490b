use groundrag_core::types::Chunk;
use groundrag_text::KeywordIndex;
use groundrag_vector::VectorIndex;

#[derive(Debug, Clone)]
enum Store {
    Indexed(VectorIndex),
    Chunks(Vec<Chunk>),
}

/// The chunk sequence one ingestion produced, with its keyword index and,
/// when the build succeeded, the vector index over the same positions.
#[derive(Debug, Clone)]
pub struct Corpus {
    store: Store,
    keyword: KeywordIndex,
}

impl Corpus {
    pub fn empty() -> Self {
        Self::keyword_only(Vec::new())
    }

    /// A corpus without embeddings; retrieval always takes the keyword path.
    pub fn keyword_only(chunks: Vec<Chunk>) -> Self {
        let keyword = KeywordIndex::new(&chunks);
        Self { store: Store::Chunks(chunks), keyword }
    }

    pub fn with_index(index: VectorIndex) -> Self {
        let keyword = KeywordIndex::new(index.chunks());
        Self { store: Store::Indexed(index), keyword }
    }

    pub fn chunks(&self) -> &[Chunk] {
        match &self.store {
            Store::Indexed(index) => index.chunks(),
            Store::Chunks(chunks) => chunks,
        }
    }

    pub fn len(&self) -> usize { self.chunks().len() }

    pub fn is_empty(&self) -> bool { self.chunks().is_empty() }

    /// The vector index, when one is populated.
    pub fn vector_index(&self) -> Option<&VectorIndex> {
        match &self.store {
            Store::Indexed(index) if !index.is_empty() => Some(index),
            _ => None,
        }
    }

    pub fn keyword_index(&self) -> &KeywordIndex { &self.keyword }
}

impl Default for Corpus {
    fn default() -> Self { Self::empty() }
}
