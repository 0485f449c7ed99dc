//! Ollama embedding and generation providers.
//!
//! This module is only available when the `ollama` feature is enabled (on by
//! default). Both providers talk to a local Ollama server over its REST API
//! using `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationProvider;

/// The default Ollama server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default model for both embeddings and generation.
pub const DEFAULT_MODEL: &str = "llama2";

/// The default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const PROVIDER: &str = "Ollama";

/// Connection settings shared by the Ollama providers.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server, without a trailing slash.
    pub base_url: String,
    /// Model name, e.g. `llama2` or `nomic-embed-text`.
    pub model: String,
    /// Timeout applied to each HTTP request.
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OllamaConfig {
    /// Config for `model` on the default local server.
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), ..Self::default() }
    }

    /// Set the server base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder().timeout(self.timeout).build().map_err(|e| {
            RagError::ConfigError(format!("failed to build HTTP client for {PROVIDER}: {e}"))
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

fn unavailable(err: reqwest::Error) -> RagError {
    error!(provider = PROVIDER, error = %err, "request failed");
    RagError::ProviderUnavailable { provider: PROVIDER.to_string(), message: err.to_string() }
}

/// Turn a non-2xx response into a readable message, preferring Ollama's `error` field.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
    error!(provider = PROVIDER, %status, "API error");
    format!("API returned {status}: {detail}")
}

/// An [`EmbeddingProvider`] backed by Ollama's `/api/embed` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::ollama::{OllamaConfig, OllamaEmbeddingProvider};
///
/// let provider = OllamaEmbeddingProvider::new(OllamaConfig::new("llama2"))?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaEmbeddingProvider {
    /// Create a provider from the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        Ok(Self { client: config.client()?, config })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::EmbeddingError {
            provider: PROVIDER.into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.config.model,
            "embedding batch"
        );

        let request_body = EmbedRequest { model: &self.config.model, input: texts.to_vec() };
        let response = self
            .client
            .post(self.config.endpoint("/api/embed"))
            .json(&request_body)
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            return Err(RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: error_detail(response).await,
            });
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    parsed.embeddings.len()
                ),
            });
        }

        Ok(parsed.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// A [`GenerationProvider`] backed by Ollama's `/api/generate` endpoint with
/// streaming disabled.
pub struct OllamaGenerationProvider {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaGenerationProvider {
    /// Create a provider from the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        Ok(Self { client: config.client()?, config })
    }
}

#[async_trait]
impl GenerationProvider for OllamaGenerationProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.config.model, prompt_len = prompt.len(), "generating");

        let request_body =
            GenerateRequest { model: &self.config.model, prompt, stream: false };
        let response = self
            .client
            .post(self.config.endpoint("/api/generate"))
            .json(&request_body)
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            return Err(RagError::GenerationError {
                provider: PROVIDER.into(),
                message: error_detail(response).await,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::GenerationError {
                provider: PROVIDER.into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parsed.response)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = OllamaConfig::new("m").with_base_url("http://host:1234/");
        assert_eq!(config.endpoint("/api/embed"), "http://host:1234/api/embed");
    }

    #[tokio::test]
    async fn unreachable_server_is_provider_unavailable() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = OllamaConfig::new("llama2").with_base_url(format!("http://{addr}"));
        let generator = OllamaGenerationProvider::new(config.clone()).unwrap();
        let err = generator.generate("hi").await.unwrap_err();
        assert!(matches!(err, RagError::ProviderUnavailable { .. }), "{err:?}");

        let embedder = OllamaEmbeddingProvider::new(config).unwrap();
        assert!(embedder.embed("hi").await.unwrap_err().is_retryable());
    }
}
