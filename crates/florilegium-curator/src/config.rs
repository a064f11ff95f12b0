//! Configuration for the Curator

use florilegium_llm::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Curator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    /// Candidates shown to the grouping capability per call
    pub group_batch_size: usize,

    /// Candidates shared between consecutive batches, so a dialogue split
    /// across a batch edge can still be grouped
    pub group_batch_overlap: usize,

    /// Smallest group worth committing
    pub min_group_size: usize,

    /// Maximum time for a single capability call (seconds, 0 = no limit)
    pub call_timeout_secs: u64,

    /// Retry policy for grouping and judgment calls
    pub retry: RetryConfig,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            group_batch_size: 20,
            group_batch_overlap: 10,
            min_group_size: 2,
            call_timeout_secs: 120,
            retry: RetryConfig::default(),
        }
    }
}

impl CuratorConfig {
    /// Aggressive preset: small batches, short timeouts, more retries
    pub fn aggressive() -> Self {
        Self {
            group_batch_size: 10,
            group_batch_overlap: 5,
            min_group_size: 2,
            call_timeout_secs: 60,
            retry: RetryConfig::aggressive(),
        }
    }

    /// Lenient preset: large batches and long timeouts
    pub fn lenient() -> Self {
        Self {
            group_batch_size: 40,
            group_batch_overlap: 20,
            min_group_size: 2,
            call_timeout_secs: 300,
            retry: RetryConfig::lenient(),
        }
    }

    /// Distance between the starts of consecutive batches
    pub fn batch_step(&self) -> usize {
        self.group_batch_size.saturating_sub(self.group_batch_overlap).max(1)
    }

    /// Per-call timeout, if any
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_secs > 0).then(|| Duration::from_secs(self.call_timeout_secs))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.group_batch_size == 0 {
            return Err("group_batch_size must be greater than 0".to_string());
        }
        if self.group_batch_overlap >= self.group_batch_size {
            return Err(format!(
                "group_batch_overlap ({}) must be smaller than group_batch_size ({})",
                self.group_batch_overlap, self.group_batch_size
            ));
        }
        if self.min_group_size < 2 {
            return Err("min_group_size must be at least 2".to_string());
        }
        self.retry.validate()
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
