//! Document loading and fixed-window chunking.
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

const DOCUMENT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

#[derive(Debug, Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new(chunking_config: ChunkingConfig) -> Result<Self> {
        chunking_config.validate()?;
        Ok(Self { chunking_config })
    }

    pub fn chunking_config(&self) -> ChunkingConfig { self.chunking_config }

    /// Read a single text file, or every text/markdown file directly inside a
    /// directory in file-name order. Document ids follow load order.
    pub fn load_documents(&self, source: &Path) -> Result<Vec<Document>> {
        let files = if source.is_file() {
            vec![source.to_path_buf()]
        } else if source.is_dir() {
            list_document_files(source)?
        } else {
            return Err(Error::Ingestion(format!("{} is neither a file nor a directory", source.display())));
        };
        let mut documents = Vec::with_capacity(files.len());
        for (id, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), "reading document {}/{}", id + 1, files.len());
            let text = read_file_content(file_path)?;
            documents.push(Document { id, source: file_path.to_string_lossy().to_string(), text });
        }
        info!("Loaded {} documents from {}", documents.len(), source.display());
        Ok(documents)
    }

    /// Split every document, in load order, into overlapping windows.
    pub fn chunk(&self, documents: &[Document]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = documents.iter().flat_map(|doc| self.chunk_document(doc)).collect();
        info!("Created {} chunks from {} documents", chunks.len(), documents.len());
        chunks
    }

    fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        // Byte offset of every char plus the end, so char windows slice on boundaries.
        let boundaries: Vec<usize> = doc.text.char_indices().map(|(i, _)| i).chain(std::iter::once(doc.text.len())).collect();
        let char_len = boundaries.len() - 1;
        let stride = self.chunking_config.stride();
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < char_len {
            let end = (start + self.chunking_config.chunk_size).min(char_len);
            let chunk_index = chunks.len();
            chunks.push(Chunk {
                id: Chunk::chunk_id(doc.id, chunk_index),
                doc_id: doc.id,
                source: doc.source.clone(),
                chunk_index,
                offset: start,
                text: doc.text[boundaries[start]..boundaries[end]].to_string(),
            });
            if end >= char_len { break; }
            start += stride;
        }
        chunks
    }
}

/// Chunk `documents` with the given window parameters.
pub fn chunk_documents(documents: &[Document], chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    let processor = DataProcessor::new(ChunkingConfig::new(chunk_size, overlap)?)?;
    Ok(processor.chunk(documents))
}

fn read_file_content(file_path: &Path) -> Result<String> {
    let bytes = fs::read(file_path).map_err(|e| Error::Ingestion(format!("{}: {e}", file_path.display())))?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).to_string()),
    }
}

fn list_document_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Ingestion(e.to_string()))?;
        if !entry.file_type().is_file() { continue; }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| DOCUMENT_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)));
        if matches { files.push(path.to_path_buf()); }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document { id: 0, source: "mem".into(), text: text.into() }
    }

    #[test]
    fn multibyte_text_slices_on_char_boundaries() {
        let processor = DataProcessor::new(ChunkingConfig::new(3, 1).expect("config")).expect("processor");
        let chunks = processor.chunk(&[doc("héllo wörld")]);
        assert_eq!(chunks[0].text, "hél");
        assert_eq!(chunks[1].text, "llo");
        assert_eq!(chunks[1].offset, 2);
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let processor = DataProcessor::default();
        assert!(processor.chunk(&[doc("")]).is_empty());
    }

    #[test]
    fn document_shorter_than_overlap_is_one_chunk() {
        let processor = DataProcessor::new(ChunkingConfig::new(10, 8).expect("config")).expect("processor");
        let chunks = processor.chunk(&[doc("abc")]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "abc");
    }
}
