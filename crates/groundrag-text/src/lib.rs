//! groundrag-text
//!
//! Keyword-overlap retrieval over chunk token sets. Deterministic and local,
//! it is the fallback whenever the vector path is unavailable.
pub mod index;

pub use index::KeywordIndex;
