//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API.
//!
//! Retries are not done here. A failed request is reported once, classified
//! through [`LlmError`], and the orchestrator's [`crate::RetryPolicy`] decides
//! whether to try again.
//!
//! # Examples
//!
//! ```no_run
//! use florilegium_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3");
//! ```

use crate::LlmError;
use florilegium_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API provider for local LLM inference
#[derive(Clone)]
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider whose HTTP requests give up after `timeout`
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            timeout,
        }
    }

    /// Create a new Ollama provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Model name sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate text using the Ollama API
    ///
    /// # Errors
    ///
    /// - `Communication` if Ollama is not reachable or answers with a 5xx
    /// - `RateLimitExceeded` on HTTP 429
    /// - `ModelNotAvailable` on HTTP 404
    /// - `InvalidResponse` if the body is not a generate response
    pub async fn generate_async(&self, prompt: &str, json: bool) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: json.then_some("json"),
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), json, "ollama request");

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response
            .json::<OllamaGenerateResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(body.response)
    }

    /// Drive `fut` to completion from synchronous code.
    ///
    /// Must not be called from inside an async task; the orchestrators call
    /// providers from `spawn_blocking`, where the ambient runtime handle may
    /// be reused.
    fn block_on<F: Future>(&self, fut: F) -> Result<F::Output, LlmError> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Ok(handle.block_on(fut)),
            Err(_) => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
                Ok(runtime.block_on(fut))
            }
        }
    }
}

impl LlmProviderTrait for OllamaProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.block_on(self.generate_async(prompt, false))?
    }

    fn generate_json(&self, prompt: &str) -> Result<String, Self::Error> {
        self.block_on(self.generate_async(prompt, true))?
    }
}

impl std::fmt::Debug for OllamaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model(), "llama3");
        assert_eq!(provider.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model, "mistral");
    }

    #[test]
    fn test_json_request_sets_format() {
        let body = OllamaGenerateRequest {
            model: "llama3",
            prompt: "p",
            stream: false,
            format: Some("json"),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["format"], "json");

        let plain = OllamaGenerateRequest { format: None, ..body };
        let value = serde_json::to_value(&plain).unwrap();
        assert!(value.get("format").is_none());
    }

    #[tokio::test]
    #[ignore] // Only run when Ollama is available
    async fn test_ollama_generate_integration() {
        let provider = OllamaProvider::default_endpoint("llama3");
        if let Ok(response) = provider.generate_async("Say 'hello' and nothing else", false).await {
            assert!(!response.is_empty());
        }
    }

    #[tokio::test]
    async fn test_ollama_unreachable_is_communication_error() {
        // Nothing listens on port 9 (discard) in the test environment
        let provider = OllamaProvider::with_timeout(
            "http://127.0.0.1:9",
            "llama3",
            Duration::from_secs(2),
        );

        let result = provider.generate_async("test", false).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
