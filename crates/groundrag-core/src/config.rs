//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge compiled defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys). Provides helpers to expand
//! `~` and `${VAR}` and to resolve relative paths against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::traits::CompletionParams;

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Load `config.toml` from the working directory plus env overlays.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Same as [`Config::load`], but `file` replaces `config.toml` when given.
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let base = file.map_or_else(|| PathBuf::from("config.toml"), Path::to_path_buf);

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(&base));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(sibling(&base, "config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(sibling(&base, "config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(sibling(&base, "config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::Configuration(format!("Failed to get '{key}': {e}")))
    }

    /// Extract and validate the typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

fn sibling(base: &Path, name: &str) -> PathBuf {
    base.parent().map_or_else(|| PathBuf::from(name), |dir| dir.join(name))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub grounding: GroundingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.embedding.batch_size == 0 {
            return Err(Error::Configuration("embedding.batch_size must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub source_path: String,
    pub index_path: String,
}

impl DataSettings {
    pub fn source_path(&self) -> PathBuf {
        resolve_with_base(&current_dir(), &self.source_path)
    }

    pub fn index_path(&self) -> PathBuf {
        resolve_with_base(&current_dir(), &self.index_path)
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source_path: "data/docs".to_string(),
            index_path: "data/index/groundrag-index.json".to_string(),
        }
    }
}

/// Window size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be > 0".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::Configuration(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Hash,
    Http,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub dimension: usize,
    pub flavor: ApiFlavor,
    pub endpoint: Option<String>,
    /// Model name, or deployment name for Azure.
    pub model: String,
    pub api_key: Option<String>,
    pub api_version: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hash,
            dimension: 384,
            flavor: ApiFlavor::OpenAi,
            endpoint: None,
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            api_version: "2024-02-01".to_string(),
            batch_size: 64,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    OpenAi,
    Azure,
}

impl ApiFlavor {
    /// Full URL of `operation` (`chat/completions`, `embeddings`) for `model`.
    pub fn url(self, endpoint: &str, model: &str, api_version: &str, operation: &str) -> String {
        let base = endpoint.trim_end_matches('/');
        match self {
            ApiFlavor::OpenAi => format!("{base}/{operation}"),
            ApiFlavor::Azure => format!("{base}/openai/deployments/{model}/{operation}?api-version={api_version}"),
        }
    }

    /// Header name and value carrying `api_key`.
    pub fn auth_header(self, api_key: &str) -> (&'static str, String) {
        match self {
            ApiFlavor::OpenAi => ("Authorization", format!("Bearer {api_key}")),
            ApiFlavor::Azure => ("api-key", api_key.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub flavor: ApiFlavor,
    pub endpoint: Option<String>,
    /// Model name, or deployment name for Azure.
    pub model: String,
    pub api_key: Option<String>,
    pub api_version: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn params(&self) -> CompletionParams {
        CompletionParams { temperature: self.temperature, max_tokens: self.max_tokens }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            flavor: ApiFlavor::OpenAi,
            endpoint: None,
            model: "gpt-35-turbo".to_string(),
            api_key: None,
            api_version: "2024-02-01".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingSettings {
    pub llm_judge: bool,
}

fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let settings = Settings::default();
        settings.validate().expect("defaults are valid");
        assert_eq!(settings.chunking.stride(), 800);
        assert_eq!(settings.retrieval.top_k, 5);
    }

    #[test]
    fn overlap_must_be_below_chunk_size() {
        assert!(matches!(ChunkingConfig::new(100, 100), Err(Error::Configuration(_))));
        assert!(matches!(ChunkingConfig::new(0, 0), Err(Error::Configuration(_))));
        assert!(ChunkingConfig::new(100, 99).is_ok());
    }

    #[test]
    fn figment_overrides_nested_keys() {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::string("[chunking]\nchunk_size = 50\noverlap = 10\n[grounding]\nllm_judge = true"));
        let config = Config::from_figment(figment);
        let settings = config.settings().expect("settings");
        assert_eq!(settings.chunking, ChunkingConfig { chunk_size: 50, overlap: 10 });
        assert!(settings.grounding.llm_judge);
        assert_eq!(config.get::<usize>("retrieval.top_k").expect("top_k"), 5);
    }

    #[test]
    fn invalid_chunking_is_a_configuration_error() {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::string("[chunking]\nchunk_size = 10\noverlap = 10"));
        let err = Config::from_figment(figment).settings().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn flavor_builds_endpoint_urls() {
        assert_eq!(
            ApiFlavor::OpenAi.url("http://localhost:1234/v1/", "m", "x", "embeddings"),
            "http://localhost:1234/v1/embeddings"
        );
        assert_eq!(
            ApiFlavor::Azure.url("https://acme.openai.azure.com", "gpt", "2024-02-01", "chat/completions"),
            "https://acme.openai.azure.com/openai/deployments/gpt/chat/completions?api-version=2024-02-01"
        );
        assert_eq!(ApiFlavor::Azure.auth_header("k").0, "api-key");
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/rag");
        assert_eq!(resolve_with_base(base, "docs"), PathBuf::from("/srv/rag/docs"));
        assert_eq!(resolve_with_base(base, "/abs/docs"), PathBuf::from("/abs/docs"));
    }
}
