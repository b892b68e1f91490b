//! The retrieval-and-grounding pipeline.
//!
//! Ingestion: load -> chunk -> embed -> build index -> persist -> swap.
//! Query: retrieve -> generate -> score.
//!
//! The current [`Corpus`] sits behind `RwLock<Arc<_>>`. Queries clone the
//! `Arc` and release the lock before calling any gateway; ingestion does all
//! of its work on a private corpus and takes the write lock only to swap it in.
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{info, warn};

use groundrag_core::config::Settings;
use groundrag_core::data_processor::DataProcessor;
use groundrag_core::traits::{is_error_completion, CompletionGateway, EmbeddingGateway};
use groundrag_core::types::{Answer, Chunk};
use groundrag_core::{Error, Result};
use groundrag_embed::get_default_embedder;
use groundrag_grounding::{GroundingScorer, JudgedGrounding, LexicalGrounding};
use groundrag_llm::get_default_completion;
use groundrag_llm::prompts::qa_prompt;
use groundrag_retrieve::{Corpus, Retrieval, Retriever};
use groundrag_vector::{BuildOptions, VectorIndex};

/// Answer text used when retrieval finds nothing.
pub const NO_RELEVANT_DOCUMENTS: &str = "No relevant documents were found for this question.";

/// What one ingestion produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub vector_indexed: bool,
    pub persisted: bool,
}

pub struct RagPipeline {
    settings: Settings,
    embedder: Option<Arc<dyn EmbeddingGateway>>,
    completion: Arc<dyn CompletionGateway>,
    scorer: Box<dyn GroundingScorer>,
    corpus: RwLock<Arc<Corpus>>,
    ingest_gate: Mutex<()>,
    show_progress: bool,
}

impl RagPipeline {
    /// Fails with `Error::Configuration` on invalid settings. The scorer is
    /// the LLM judge when `grounding.llm_judge` is set, lexical otherwise.
    pub fn new(
        settings: Settings,
        embedder: Option<Arc<dyn EmbeddingGateway>>,
        completion: Arc<dyn CompletionGateway>,
    ) -> Result<Self> {
        settings.validate()?;
        let scorer: Box<dyn GroundingScorer> = if settings.grounding.llm_judge {
            Box::new(JudgedGrounding::new(Arc::clone(&completion)))
        } else {
            Box::new(LexicalGrounding)
        };
        Ok(Self {
            settings,
            embedder,
            completion,
            scorer,
            corpus: RwLock::new(Arc::new(Corpus::empty())),
            ingest_gate: Mutex::new(()),
            show_progress: false,
        })
    }

    /// Gateways chosen from `settings.embedding` and `settings.llm`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embedder = get_default_embedder(&settings.embedding)?.map(Arc::from);
        let completion = Arc::from(get_default_completion(&settings.llm)?);
        Self::new(settings, embedder, completion)
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    /// Snapshot of the current corpus; stays valid across later ingestions.
    pub fn corpus(&self) -> Arc<Corpus> {
        let guard = self.corpus.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn install(&self, corpus: Corpus) {
        let mut guard = self.corpus.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(corpus);
    }

    /// Rebuild the corpus from `source` (default `data.source_path`).
    ///
    /// Only invalid chunking settings fail. An unreadable source leaves an
    /// empty corpus, a failed index build leaves a keyword-only corpus, and a
    /// failed snapshot write is logged. Whenever no new snapshot is written the
    /// previous one is removed, so a warm start rebuilds from source instead of
    /// reloading the replaced corpus.
    pub fn ingest(&self, source: Option<&Path>) -> Result<IngestReport> {
        let processor = DataProcessor::new(self.settings.chunking)?;
        let _gate = self.ingest_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let source = source.map_or_else(|| self.settings.data.source_path(), Path::to_path_buf);

        let documents = processor.load_documents(&source).unwrap_or_else(|e| {
            warn!("{e}; continuing with no documents");
            Vec::new()
        });
        let chunks = processor.chunk(&documents);
        let mut report = IngestReport { documents: documents.len(), chunks: chunks.len(), vector_indexed: false, persisted: false };

        let path = self.settings.data.index_path();
        let corpus = match self.build_index(&chunks) {
            Some(index) => {
                report.vector_indexed = true;
                match index.save(&path) {
                    Ok(()) => report.persisted = true,
                    Err(e) => warn!("{e}; index kept in memory only"),
                }
                Corpus::with_index(index)
            }
            None => Corpus::keyword_only(chunks),
        };
        if !report.persisted {
            match VectorIndex::discard(&path) {
                Ok(true) => warn!("Discarded stale snapshot {}; next warm start rebuilds from source", path.display()),
                Ok(false) => {}
                Err(e) => warn!("{e}; a warm start may reload the previous corpus"),
            }
        }
        self.install(corpus);
        info!(
            documents = report.documents,
            chunks = report.chunks,
            vector_indexed = report.vector_indexed,
            "Ingestion complete from {}",
            source.display()
        );
        Ok(report)
    }

    fn build_index(&self, chunks: &[Chunk]) -> Option<VectorIndex> {
        if chunks.is_empty() {
            return None;
        }
        let Some(embedder) = self.embedder.as_deref() else {
            info!("No embedding gateway; corpus is keyword-only");
            return None;
        };
        let options = BuildOptions { batch_size: self.settings.embedding.batch_size, show_progress: self.show_progress };
        match VectorIndex::build(chunks, embedder, &options) {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("{e}; retrieval will use keyword overlap");
                None
            }
        }
    }

    /// Install the snapshot at `data.index_path`.
    pub fn load_snapshot(&self) -> Result<usize> {
        let _gate = self.ingest_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let index = VectorIndex::load(&self.settings.data.index_path())?;
        if let Some(expected) = self.embedder.as_deref().and_then(|e| e.dim()) {
            if !index.is_empty() && index.dimension() != expected {
                return Err(Error::IndexUnavailable(format!(
                    "snapshot dim {} does not match embedder dim {expected}",
                    index.dimension()
                )));
            }
        }
        let len = index.len();
        self.install(Corpus::with_index(index));
        Ok(len)
    }

    /// Load the persisted snapshot, or ingest from `data.source_path` when it
    /// is missing, corrupt or built for a different embedder.
    pub fn warm_start(&self) -> Result<()> {
        match self.load_snapshot() {
            Ok(len) => {
                info!("Warm start from snapshot with {len} chunks");
                Ok(())
            }
            Err(e) => {
                warn!("{e}; rebuilding from source");
                self.ingest(None).map(|_| ())
            }
        }
    }

    /// Ranked chunks for `query`; never fails.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Retrieval {
        let corpus = self.corpus();
        Retriever::new(&corpus, self.embedder.as_deref()).retrieve(query, top_k)
    }

    /// Retrieve, generate, score. Only generation failures are returned as
    /// errors; an empty retrieval answers without calling the model.
    pub fn answer(&self, query: &str, top_k: usize) -> Result<Answer> {
        let retrieval = self.retrieve(query, top_k);
        if retrieval.is_empty() {
            return Ok(Answer {
                answer_text: NO_RELEVANT_DOCUMENTS.to_string(),
                cited_chunk_ids: Vec::new(),
                average_relevance: 0.0,
                grounding_score: 0.0,
            });
        }
        let average_relevance = retrieval.hits.iter().map(|h| h.score).sum::<f32>() / retrieval.hits.len() as f32;
        let sources: Vec<String> = retrieval.hits.iter().map(|h| h.text.clone()).collect();

        let answer_text = self
            .completion
            .complete(&qa_prompt(&sources, query), &self.settings.llm.params())
            .map_err(|e| Error::Generation(e.to_string()))?;
        if is_error_completion(&answer_text) {
            return Err(Error::Generation(answer_text));
        }

        let grounding_score = self.scorer.score(&answer_text, &sources);
        Ok(Answer {
            answer_text,
            cited_chunk_ids: retrieval.hits.into_iter().map(|h| h.chunk_id).collect(),
            average_relevance: average_relevance.clamp(0.0, 1.0),
            grounding_score,
        })
    }
}
