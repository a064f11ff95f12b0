//! Configuration for the Extractor

use florilegium_llm::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do with a chunk whose retries are exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and continue with the next chunk
    #[default]
    Skip,
    /// Stop the run at the failed chunk
    Abort,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum chunk size (characters)
    pub max_chunk_size: usize,

    /// Characters repeated from the end of one chunk at the start of the
    /// next. Defaults to 10% of `max_chunk_size` when unset.
    pub overlap_size: Option<usize>,

    /// Characters per estimated page, for the page part of source identifiers
    pub chars_per_estimated_page: usize,

    /// How far before the hard limit a chunk may end to land on whitespace
    pub boundary_tolerance: usize,

    /// Behaviour after a chunk exhausts its retries
    pub on_chunk_failure: FailurePolicy,

    /// Maximum time for a single extraction call (seconds, 0 = no limit)
    pub call_timeout_secs: u64,

    /// Retry policy for extraction calls
    pub retry: RetryConfig,
}

impl ExtractorConfig {
    /// Overlap actually applied
    pub fn effective_overlap(&self) -> usize {
        self.overlap_size.unwrap_or(self.max_chunk_size / 10)
    }

    /// Per-call timeout, if any
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_secs > 0).then(|| Duration::from_secs(self.call_timeout_secs))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        if self.effective_overlap() >= self.max_chunk_size {
            return Err(format!(
                "overlap_size ({}) must be smaller than max_chunk_size ({})",
                self.effective_overlap(),
                self.max_chunk_size
            ));
        }
        if self.chars_per_estimated_page == 0 {
            return Err("chars_per_estimated_page must be greater than 0".to_string());
        }
        if self.boundary_tolerance > self.max_chunk_size {
            return Err(format!(
                "boundary_tolerance ({}) cannot exceed max_chunk_size ({})",
                self.boundary_tolerance, self.max_chunk_size
            ));
        }
        self.retry.validate()
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_chunk_size: 15_000,
            overlap_size: None,
            chars_per_estimated_page: 2_000,
            boundary_tolerance: 200,
            on_chunk_failure: FailurePolicy::Skip,
            call_timeout_secs: 300,
            retry: RetryConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: smaller chunks, shorter timeouts, more retries
    pub fn aggressive() -> Self {
        Self {
            max_chunk_size: 6_000,
            overlap_size: None,
            chars_per_estimated_page: 2_000,
            boundary_tolerance: 150,
            on_chunk_failure: FailurePolicy::Skip,
            call_timeout_secs: 120,
            retry: RetryConfig::aggressive(),
        }
    }

    /// Lenient preset: larger chunks, long timeouts, stop on the first failure
    pub fn lenient() -> Self {
        Self {
            max_chunk_size: 30_000,
            overlap_size: None,
            chars_per_estimated_page: 2_000,
            boundary_tolerance: 500,
            on_chunk_failure: FailurePolicy::Abort,
            call_timeout_secs: 600,
            retry: RetryConfig::lenient(),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_overlap_defaults_to_ten_percent() {
        let config = ExtractorConfig {
            max_chunk_size: 1_000,
            ..Default::default()
        };
        assert_eq!(config.effective_overlap(), 100);
    }

    #[test]
    fn test_overlap_not_smaller_than_chunk_is_rejected() {
        let config = ExtractorConfig {
            max_chunk_size: 100,
            overlap_size: Some(100),
            boundary_tolerance: 10,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("overlap_size"));
    }

    #[test]
    fn test_invalid_chunk_and_page_sizes() {
        let mut config = ExtractorConfig::default();
        config.max_chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.chars_per_estimated_page = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.boundary_tolerance = config.max_chunk_size + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let mut config = ExtractorConfig::default();
        assert_eq!(config.call_timeout(), Some(Duration::from_secs(300)));
        config.call_timeout_secs = 0;
        assert_eq!(config.call_timeout(), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml(
            r#"
            max_chunk_size = 4000
            on_chunk_failure = "abort"

            [retry]
            max_attempts = 6
            "#,
        )
        .unwrap();
        assert_eq!(config.max_chunk_size, 4_000);
        assert_eq!(config.effective_overlap(), 400);
        assert_eq!(config.on_chunk_failure, FailurePolicy::Abort);
        assert_eq!(config.retry.max_attempts, 6);
        assert_eq!(config.chars_per_estimated_page, 2_000);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::lenient();
        let parsed = ExtractorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
