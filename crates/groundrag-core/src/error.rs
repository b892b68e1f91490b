use thiserror::Error;

/// Failure kinds of the retrieval-and-grounding pipeline.
///
/// Only `Configuration` and `Generation` are expected to reach the caller of
/// the pipeline; the others are absorbed at the component that has a local
/// fallback and only surface in logs or in lower-level APIs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Grounding check degraded: {0}")]
    ScoringDegraded(String),

    #[error("Gateway error: {0}")]
    Gateway(String),
}

impl Error {
    pub fn gateway<E: std::fmt::Display>(err: E) -> Self {
        Error::Gateway(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
