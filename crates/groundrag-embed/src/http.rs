use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use groundrag_core::config::{ApiFlavor, EmbeddingSettings};
use groundrag_core::traits::EmbeddingGateway;
use groundrag_core::{Error, Result};

/// Embeddings over HTTP (`/embeddings`), bounded by a request timeout.
pub struct HttpEmbedder {
    client: Client,
    url: String,
    model: String,
    flavor: ApiFlavor,
    api_key: Option<String>,
    dim: usize,
    id: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl HttpEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let endpoint = settings
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Configuration("embedding.endpoint is required for the http provider".into()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(Error::gateway)?;
        Ok(Self {
            client,
            url: settings.flavor.url(endpoint, &settings.model, &settings.api_version, "embeddings"),
            model: settings.model.clone(),
            flavor: settings.flavor,
            api_key: settings.api_key.clone(),
            dim: settings.dimension,
            id: format!("http:{}:d{}", settings.model, settings.dimension),
        })
    }

    fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut req = self.client.post(&self.url).json(&json!({ "model": self.model, "input": texts }));
        if let Some(key) = &self.api_key {
            let (name, value) = self.flavor.auth_header(key);
            req = req.header(name, value);
        }
        let res = req.send().map_err(Error::gateway)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().unwrap_or_default();
            return Err(Error::Gateway(format!("embeddings endpoint returned {status}: {text}")));
        }
        let mut payload: EmbeddingResponse = res.json().map_err(Error::gateway)?;
        if payload.data.len() != texts.len() {
            return Err(Error::Gateway(format!("expected {} embeddings, got {}", texts.len(), payload.data.len())));
        }
        payload.data.sort_by_key(|d| d.index);
        Ok(payload.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl EmbeddingGateway for HttpEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> Option<usize> { Some(self.dim) }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        self.request(texts).map_err(|e| {
            warn!(url = %self.url, "embedding request failed: {e}");
            e
        })
    }
}
