//! Versioned snapshot container for a built [`VectorIndex`].
//!
//! The container carries a format tag, version, dimension, chunk count, the
//! chunk metadata array, the embedding matrix as raw `f32` bit patterns (so a
//! reload is bit-exact) and a blake3 checksum over both. Saving writes a temp
//! file next to the target and renames it over the target.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

use groundrag_core::types::Chunk;
use groundrag_core::{Error, Result};

use crate::index_build::VectorIndex;

pub const SNAPSHOT_FORMAT: &str = "groundrag-index";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    format: String,
    version: u32,
    dimension: usize,
    chunk_count: usize,
    checksum: String,
    chunks: Vec<Chunk>,
    embedding_bits: Vec<u32>,
}

fn corrupt(msg: impl std::fmt::Display) -> Error {
    Error::IndexUnavailable(format!("corrupt snapshot: {msg}"))
}

fn checksum(dimension: usize, chunks: &[Chunk], embedding_bits: &[u32]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(dimension as u64).to_le_bytes());
    hasher.update(&(chunks.len() as u64).to_le_bytes());
    for c in chunks {
        for field in [c.id.as_bytes(), c.source.as_bytes(), c.text.as_bytes()] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        hasher.update(&(c.doc_id as u64).to_le_bytes());
        hasher.update(&(c.chunk_index as u64).to_le_bytes());
        hasher.update(&(c.offset as u64).to_le_bytes());
    }
    for bits in embedding_bits {
        hasher.update(&bits.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

impl VectorIndex {
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let embedding_bits: Vec<u32> = self.embeddings.iter().map(|x| x.to_bits()).collect();
        let file = SnapshotFile {
            format: SNAPSHOT_FORMAT.to_string(),
            version: SNAPSHOT_VERSION,
            dimension: self.dimension,
            chunk_count: self.chunks.len(),
            checksum: checksum(self.dimension, &self.chunks, &embedding_bits),
            chunks: self.chunks.clone(),
            embedding_bits,
        };
        serde_json::to_vec(&file).map_err(|e| Error::IndexUnavailable(e.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let file: SnapshotFile = serde_json::from_slice(bytes).map_err(corrupt)?;
        if file.format != SNAPSHOT_FORMAT {
            return Err(corrupt(format!("unknown format '{}'", file.format)));
        }
        if file.version != SNAPSHOT_VERSION {
            return Err(corrupt(format!("unsupported version {}", file.version)));
        }
        if file.chunks.len() != file.chunk_count || file.chunk_count.checked_mul(file.dimension) != Some(file.embedding_bits.len()) {
            return Err(corrupt(format!(
                "header says {} chunks of dim {}, found {} chunks and {} values",
                file.chunk_count,
                file.dimension,
                file.chunks.len(),
                file.embedding_bits.len()
            )));
        }
        if file.chunk_count > 0 && file.dimension == 0 {
            return Err(corrupt("zero-dimension embeddings"));
        }
        if checksum(file.dimension, &file.chunks, &file.embedding_bits) != file.checksum {
            return Err(corrupt("checksum mismatch"));
        }
        let embeddings = file.embedding_bits.into_iter().map(f32::from_bits).collect();
        Ok(Self { dimension: file.dimension, chunks: file.chunks, embeddings })
    }

    /// Persist atomically: readers see either the old file or the complete new one.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.serialize()?;
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let io_err = |e: std::io::Error| Error::IndexUnavailable(format!("writing {}: {e}", path.display()));
        fs::create_dir_all(dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        info!("Persisted vector index ({} chunks) to {}", self.len(), path.display());
        Ok(())
    }

    /// Remove the snapshot at `path` so a later load cannot resurrect a
    /// corpus that has since been replaced. `Ok(false)` when nothing was there.
    pub fn discard(path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => {
                info!("Removed snapshot {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::IndexUnavailable(format!("removing {}: {e}", path.display()))),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::IndexUnavailable(format!("reading {}: {e}", path.display())))?;
        let index = Self::deserialize(&bytes)?;
        info!("Loaded vector index ({} chunks, dim {}) from {}", index.len(), index.dimension, path.display());
        Ok(index)
    }
}
