use crate::error::Result;

/// Converts text into fixed-dimension vectors.
pub trait EmbeddingGateway: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hash:d384`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality, when known ahead of the first call.
    fn dim(&self) -> Option<usize>;
    /// Cheap capability check evaluated before dispatching vector retrieval.
    fn is_available(&self) -> bool { true }
    /// Embed a batch; output has the same length and order as `texts`.
    /// An empty `Ok` for non-empty input means the gateway is unavailable.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Sampling parameters for a completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 500 }
    }
}

/// Language-model completion endpoint.
pub trait CompletionGateway: Send + Sync {
    fn name(&self) -> &str;
    fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String>;
}

/// Prefix used by gateways that report failures in-band as text.
pub const COMPLETION_ERROR_PREFIX: &str = "Error generating response";

/// True when `text` is an in-band failure report rather than an answer.
pub fn is_error_completion(text: &str) -> bool {
    text.trim_start().starts_with(COMPLETION_ERROR_PREFIX)
}
