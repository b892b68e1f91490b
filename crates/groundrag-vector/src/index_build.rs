//! Index construction and exact L2 search.
//!
//! Build flow:
//! 1) Embed chunk texts in batches through the gateway
//! 2) Reject empty, short or dimension-mismatched batches
//! 3) Store chunks and a row-major embedding matrix in lockstep
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use groundrag_core::traits::EmbeddingGateway;
use groundrag_core::types::Chunk;
use groundrag_core::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub batch_size: usize,
    pub show_progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { batch_size: 64, show_progress: false }
    }
}

/// Row `i` of the embedding matrix always belongs to `chunks[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    pub(crate) dimension: usize,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) embeddings: Vec<f32>,
}

impl VectorIndex {
    pub fn build(chunks: &[Chunk], gateway: &dyn EmbeddingGateway, options: &BuildOptions) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::IndexUnavailable("no chunks to index".into()));
        }
        let batch_size = options.batch_size.max(1);
        let pb = progress_bar(chunks.len(), options.show_progress);
        let mut rows: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = gateway
                .embed_batch(&texts)
                .map_err(|e| Error::IndexUnavailable(format!("embedding gateway failed: {e}")))?;
            if embeddings.is_empty() {
                return Err(Error::IndexUnavailable(format!("{} returned no embeddings", gateway.embedder_id())));
            }
            if embeddings.len() != texts.len() {
                return Err(Error::IndexUnavailable(format!(
                    "{} returned {} embeddings for {} texts",
                    gateway.embedder_id(),
                    embeddings.len(),
                    texts.len()
                )));
            }
            rows.extend(embeddings);
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        let index = Self::from_parts(chunks.to_vec(), rows)?;
        if let Some(expected) = gateway.dim() {
            if expected != index.dimension {
                return Err(Error::IndexUnavailable(format!("dim mismatch: got {} expected {}", index.dimension, expected)));
            }
        }
        info!("Built vector index: {} chunks, dim {}, embedder {}", index.len(), index.dimension, gateway.embedder_id());
        Ok(index)
    }

    /// Assemble an index from parallel chunk and embedding sequences.
    pub fn from_parts(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(Error::IndexUnavailable(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
        }
        let dimension = embeddings.first().map_or(0, Vec::len);
        if !chunks.is_empty() && dimension == 0 {
            return Err(Error::IndexUnavailable("embeddings are empty".into()));
        }
        let mut flat = Vec::with_capacity(dimension * embeddings.len());
        for (i, row) in embeddings.iter().enumerate() {
            if row.len() != dimension {
                return Err(Error::IndexUnavailable(format!("embedding {i} has dim {} expected {dimension}", row.len())));
            }
            flat.extend_from_slice(row);
        }
        Ok(Self { dimension, chunks, embeddings: flat })
    }

    pub fn len(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    pub fn dimension(&self) -> usize { self.dimension }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    pub fn embedding(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() { return None; }
        let start = position * self.dimension;
        self.embeddings.get(start..start + self.dimension)
    }

    /// Up to `min(k, len)` `(position, distance)` pairs by ascending L2
    /// distance; equal distances keep chunk order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::IndexUnavailable(format!("query dim {} does not match index dim {}", query.len(), self.dimension)));
        }
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| (position, l2_distance(query, row)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        Ok(scored)
    }
}

/// NaN (from non-finite components) counts as infinitely far.
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    let d = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt();
    if d.is_nan() { f32::INFINITY } else { d }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks embedded ({percent}%)")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
