use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use groundrag_core::config::{ApiFlavor, LlmSettings};
use groundrag_core::traits::{CompletionGateway, CompletionParams};
use groundrag_core::{Error, Result};

/// Chat completions over HTTP, OpenAI-compatible or Azure deployment URLs.
pub struct HttpCompletionGateway {
    client: Client,
    url: String,
    model: String,
    flavor: ApiFlavor,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Gateway("chat response has no message content".into()))
    }
}

impl HttpCompletionGateway {
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let endpoint = settings
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Configuration("llm.endpoint is not set".into()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(Error::gateway)?;
        Ok(Self {
            client,
            url: settings.flavor.url(endpoint, &settings.model, &settings.api_version, "chat/completions"),
            model: settings.model.clone(),
            flavor: settings.flavor,
            api_key: settings.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str { &self.url }

    fn request(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "stream": false,
        });
        let mut req = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            let (name, value) = self.flavor.auth_header(key);
            req = req.header(name, value);
        }
        let res = req.send().map_err(Error::gateway)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().unwrap_or_default();
            return Err(Error::Gateway(format!("chat endpoint returned {status}: {text}")));
        }
        let payload: ChatResponse = res.json().map_err(Error::gateway)?;
        payload.into_content()
    }
}

impl CompletionGateway for HttpCompletionGateway {
    fn name(&self) -> &str { &self.model }

    fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        debug!(url = %self.url, prompt_len = prompt.len(), "requesting completion");
        self.request(prompt, params).map_err(|e| {
            warn!(url = %self.url, "completion request failed: {e}");
            e
        })
    }
}

/// Stand-in used when no completion endpoint is configured. Every call fails,
/// so retrieval still works and `answer` reports a generation failure.
pub struct UnconfiguredGateway;

impl CompletionGateway for UnconfiguredGateway {
    fn name(&self) -> &str { "unconfigured" }

    fn complete(&self, _prompt: &str, _params: &CompletionParams) -> Result<String> {
        Err(Error::Gateway("no completion endpoint configured (set llm.endpoint)".into()))
    }
}
