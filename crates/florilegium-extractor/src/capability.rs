//! Extraction capability backed by an LLM provider

use crate::parser::parse_extraction_response;
use crate::prompt::PromptBuilder;
use florilegium_domain::traits::LlmProvider;
use florilegium_domain::{CandidatePayload, CapabilityError, ExtractCapability};
use tracing::debug;

/// Prompts an [`LlmProvider`] for the quotes in a chunk and normalizes its
/// answer into payloads.
///
/// Provider errors are classified through `Into<CapabilityError>`. Output that
/// cannot be parsed is transient: a second sample often parses.
#[derive(Debug, Clone)]
pub struct LlmExtractCapability<L> {
    provider: L,
}

impl<L> LlmExtractCapability<L> {
    /// Wrap a provider
    pub fn new(provider: L) -> Self {
        Self { provider }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &L {
        &self.provider
    }
}

impl<L> ExtractCapability for LlmExtractCapability<L>
where
    L: LlmProvider,
    L::Error: Into<CapabilityError>,
{
    fn extract(&self, chunk_text: &str) -> Result<Vec<CandidatePayload>, CapabilityError> {
        let prompt = PromptBuilder::new(chunk_text).build();
        let response = self.provider.generate_json(&prompt).map_err(Into::into)?;
        debug!(response_chars = response.len(), "extraction response received");

        parse_extraction_response(&response)
            .map_err(|e| CapabilityError::Transient(e.to_string()))
    }
}
