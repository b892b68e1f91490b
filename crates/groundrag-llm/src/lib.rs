//! Language-model gateway and the prompts the pipeline sends through it.
use tracing::info;

use groundrag_core::config::LlmSettings;
use groundrag_core::traits::CompletionGateway;
use groundrag_core::Result;

mod http;
pub mod prompts;

pub use http::{HttpCompletionGateway, UnconfiguredGateway};

/// HTTP gateway when `llm.endpoint` is set, [`UnconfiguredGateway`] otherwise.
pub fn get_default_completion(settings: &LlmSettings) -> Result<Box<dyn CompletionGateway>> {
    if settings.endpoint.is_none() {
        info!("llm.endpoint not set; answers will fail at generation");
        return Ok(Box::new(UnconfiguredGateway));
    }
    let gateway = HttpCompletionGateway::from_settings(settings)?;
    info!(url = gateway.url(), "Using HTTP completion gateway");
    Ok(Box::new(gateway))
}
