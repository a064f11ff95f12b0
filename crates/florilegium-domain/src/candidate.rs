//! Candidate module - provisional quotes awaiting curation

use crate::CandidateId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured extras attached to a quote
///
/// Stored as a serialized key-value map. Two keys are known to the pipeline;
/// anything else the generator returns is preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    /// Translation of `quote_text` when it is not in the reader's language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_translation: Option<String>,

    /// Scripture passage the quote cites (chapter or verse reference)
    #[serde(default, alias = "surah", skip_serializing_if = "Option::is_none")]
    pub scripture_reference: Option<String>,

    /// Any other keys, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl AdditionalInfo {
    /// True when no key is set
    pub fn is_empty(&self) -> bool {
        self.quote_translation.is_none()
            && self.scripture_reference.is_none()
            && self.extra.is_empty()
    }
}

/// One quote as returned by the extraction capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidatePayload {
    /// Exact text of the saying, in its original language
    pub quote_text: String,

    /// Who said it, if known
    #[serde(default)]
    pub speaker: Option<String>,

    /// Surrounding situation that gives the quote its meaning
    #[serde(default)]
    pub context: Option<String>,

    /// Main theme
    #[serde(default)]
    pub topic: Option<String>,

    /// Translation, scripture reference and other extras
    #[serde(default)]
    pub additional_info: AdditionalInfo,
}

impl CandidatePayload {
    /// Payload carrying only a quote
    pub fn quote(text: impl Into<String>) -> Self {
        Self {
            quote_text: text.into(),
            ..Default::default()
        }
    }

    /// Check that the payload can become a candidate
    pub fn validate(&self) -> Result<(), String> {
        if self.quote_text.trim().is_empty() {
            return Err("quote_text is empty".to_string());
        }
        Ok(())
    }
}

/// Build the source identifier recorded on a candidate.
///
/// # Examples
///
/// ```
/// use florilegium_domain::candidate::source_identifier;
///
/// assert_eq!(source_identifier("Chapter 2", 14), "Chapter 2 | p.14");
/// ```
pub fn source_identifier(section_id: &str, estimated_page: usize) -> String {
    format!("{} | p.{}", section_id, estimated_page)
}

/// A candidate ready for insertion, before the store assigns an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewCandidate {
    /// Section id plus estimated page where the quote was found
    pub source_identifier: String,
    /// Quote body; with `source_identifier` forms the uniqueness key
    pub quote_text: String,
    /// Speaker, if known
    pub speaker: Option<String>,
    /// Context
    pub context: Option<String>,
    /// Topic
    pub topic: Option<String>,
    /// Extras
    pub additional_info: AdditionalInfo,
}

impl NewCandidate {
    /// Attach provenance to an extracted payload
    pub fn from_payload(payload: CandidatePayload, source_identifier: String) -> Self {
        Self {
            source_identifier,
            quote_text: payload.quote_text,
            speaker: payload.speaker,
            context: payload.context,
            topic: payload.topic,
            additional_info: payload.additional_info,
        }
    }
}

/// A stored candidate. Every field is set once at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Surrogate key
    pub id: CandidateId,
    /// Where in the document the quote originated
    pub source_identifier: String,
    /// Original-language quote text
    pub quote_text: String,
    /// Speaker
    pub speaker: Option<String>,
    /// Context
    pub context: Option<String>,
    /// Topic
    pub topic: Option<String>,
    /// Extras
    pub additional_info: AdditionalInfo,
    /// Creation time (unix seconds)
    pub created_at: u64,
}
