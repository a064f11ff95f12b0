//! Grouping and judgment capabilities backed by an LLM provider

use crate::parser::{parse_group_response, parse_verdict};
use crate::prompt::{group_prompt, judge_prompt};
use florilegium_domain::traits::LlmProvider;
use florilegium_domain::{
    Candidate, CapabilityError, GroupCapability, JudgeCapability, Judgment, ProposedGroup, Verdict,
};
use tracing::{debug, warn};

/// Asks an [`LlmProvider`] which candidates of a batch belong together.
///
/// Candidates go out numbered by their position in the batch and the reply's
/// numbers are mapped back to candidate ids. Unknown numbers are dropped.
/// A group without a label is named after its first member's topic, or
/// `group-<n>` when that has none.
#[derive(Debug, Clone)]
pub struct LlmGroupCapability<L> {
    provider: L,
}

impl<L> LlmGroupCapability<L> {
    /// Wrap a provider
    pub fn new(provider: L) -> Self {
        Self { provider }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &L {
        &self.provider
    }
}

impl<L> GroupCapability for LlmGroupCapability<L>
where
    L: LlmProvider,
    L::Error: Into<CapabilityError>,
{
    fn group(&self, candidates: &[Candidate]) -> Result<Vec<ProposedGroup>, CapabilityError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .provider
            .generate_json(&group_prompt(candidates))
            .map_err(Into::into)?;
        let parsed = parse_group_response(&response)
            .map_err(|e| CapabilityError::Transient(e.to_string()))?;

        let mut groups = Vec::with_capacity(parsed.len());
        for (n, group) in parsed.into_iter().enumerate() {
            let members: Vec<&Candidate> = group
                .ordinals
                .iter()
                .filter_map(|&ordinal| match ordinal.checked_sub(1).and_then(|i| candidates.get(i)) {
                    Some(candidate) => Some(candidate),
                    None => {
                        warn!(ordinal, batch = candidates.len(), "Ignoring unknown group member");
                        None
                    }
                })
                .collect();
            let Some(first) = members.first() else {
                continue;
            };

            let label = group.label.unwrap_or_else(|| match &first.topic {
                Some(topic) => slug(topic),
                None => format!("group-{}", n + 1),
            });
            groups.push(ProposedGroup::new(
                label,
                members.iter().map(|c| c.id).collect(),
            ));
        }
        debug!(batch = candidates.len(), groups = groups.len(), "grouping response parsed");
        Ok(groups)
    }
}

fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Asks an [`LlmProvider`] whether a single candidate should be kept
#[derive(Debug, Clone)]
pub struct LlmJudgeCapability<L> {
    provider: L,
}

impl<L> LlmJudgeCapability<L> {
    /// Wrap a provider
    pub fn new(provider: L) -> Self {
        Self { provider }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &L {
        &self.provider
    }
}

impl<L> JudgeCapability for LlmJudgeCapability<L>
where
    L: LlmProvider,
    L::Error: Into<CapabilityError>,
{
    fn judge(&self, candidate: &Candidate) -> Result<Judgment, CapabilityError> {
        let response = self
            .provider
            .generate(&judge_prompt(candidate))
            .map_err(Into::into)?;
        let reply = response.trim();

        let judgment = match parse_verdict(reply) {
            Verdict::Approve => Judgment::approve(),
            Verdict::Decline => Judgment::decline(reply),
            Verdict::Uncertain => Judgment::uncertain(),
        };
        debug!(candidate = %candidate.id, verdict = ?judgment.verdict, "judgment received");
        Ok(judgment)
    }
}
