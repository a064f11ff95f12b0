//! Florilegium LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `florilegium-domain`, plus
//! the retry policy the orchestrators wrap around every capability call.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Error classification
//!
//! Every [`LlmError`] maps onto a [`CapabilityError`]: a missing model is
//! terminal, everything else may succeed on a later attempt.
//!
//! # Examples
//!
//! ```
//! use florilegium_llm::MockProvider;
//! use florilegium_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod retry;

use florilegium_domain::traits::LlmProvider as LlmProviderTrait;
use florilegium_domain::CapabilityError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use retry::{RetryConfig, RetryPolicy, Retryable};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<LlmError> for CapabilityError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ModelNotAvailable(_) => CapabilityError::Terminal(err.to_string()),
            _ => CapabilityError::Transient(err.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure,
    Unavailable,
}

impl Reply {
    fn into_result(self) -> Result<String, LlmError> {
        match self {
            Reply::Text(text) => Ok(text),
            Reply::Failure => Err(LlmError::Communication("Mock error".to_string())),
            Reply::Unavailable => Err(LlmError::ModelNotAvailable("mock".to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    queued: VecDeque<Reply>,
    keyed: Vec<(String, Reply)>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Replies are chosen in this order: the next queued reply, then the first
/// keyed reply whose key occurs in the prompt, then the default response.
///
/// # Examples
///
/// ```
/// use florilegium_llm::MockProvider;
/// use florilegium_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// // Replies keyed on prompt content
/// let mut provider = MockProvider::default();
/// provider.add_response("patience", "[]");
/// assert_eq!(provider.generate("a text about patience").unwrap(), "[]");
///
/// // One-off replies, consumed in order
/// provider.queue_error();
/// provider.queue_response("first");
/// assert!(provider.generate("x").is_err());
/// assert_eq!(provider.generate("x").unwrap(), "first");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reply with `response` whenever the prompt contains `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        self.state()
            .keyed
            .push((key.into(), Reply::Text(response.into())));
    }

    /// Fail with a communication error whenever the prompt contains `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        self.state().keyed.push((key.into(), Reply::Failure));
    }

    /// Reply with `response` to the next unmatched call
    pub fn queue_response(&self, response: impl Into<String>) {
        self.state().queued.push_back(Reply::Text(response.into()));
    }

    /// Fail the next call with a communication error
    pub fn queue_error(&self) {
        self.state().queued.push_back(Reply::Failure);
    }

    /// Fail the next call with `ModelNotAvailable`
    pub fn queue_unavailable(&self) {
        self.state().queued.push_back(Reply::Unavailable);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    /// Every prompt received so far
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.state().prompts.clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let mut state = self.state();
        state.prompts.push(prompt.to_string());

        if let Some(reply) = state.queued.pop_front() {
            return reply.into_result();
        }
        let keyed = state
            .keyed
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, reply)| reply.clone());
        match keyed {
            Some(reply) => reply.into_result(),
            None => Ok(self.default_response.clone()),
        }
    }

    fn generate_json(&self, prompt: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }
}
