//! Embedding gateways.
//!
//! `HashEmbedder` is deterministic and offline; `HttpEmbedder` calls an
//! OpenAI-compatible or Azure embeddings endpoint. [`get_default_embedder`]
//! picks one from settings and honours `APP_USE_FAKE_EMBEDDINGS=1`.
use tracing::info;

use groundrag_core::config::{EmbeddingProvider, EmbeddingSettings};
use groundrag_core::traits::EmbeddingGateway;
use groundrag_core::Result;

mod hash;
mod http;

pub use hash::HashEmbedder;
pub use http::HttpEmbedder;

/// Build the configured gateway; `None` when embeddings are disabled.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Option<Box<dyn EmbeddingGateway>>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if use_fake {
        info!("Using HashEmbedder (APP_USE_FAKE_EMBEDDINGS)");
        return Ok(Some(Box::new(HashEmbedder::new(settings.dimension))));
    }
    match settings.provider {
        EmbeddingProvider::Hash => Ok(Some(Box::new(HashEmbedder::new(settings.dimension)))),
        EmbeddingProvider::Http => Ok(Some(Box::new(HttpEmbedder::from_settings(settings)?))),
        EmbeddingProvider::None => {
            info!("Embeddings disabled; retrieval will use keyword overlap");
            Ok(None)
        }
    }
}
