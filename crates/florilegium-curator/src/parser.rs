//! Parse grouping and judgment replies

use crate::error::CuratorError;
use florilegium_domain::Verdict;
use serde_json::Value;
use tracing::warn;

/// A group as the generator wrote it, members given by batch ordinal (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGroup {
    /// Label, when the reply carried one
    pub label: Option<String>,
    /// Batch ordinals of the members
    pub ordinals: Vec<usize>,
}

/// Parse a grouping reply.
///
/// Accepts `[{"label": "..", "ids": [1, 2]}]`, the bare `[[1, 2]]` form, or
/// either of them wrapped in an object under a single key. Empty output is
/// no groups.
pub fn parse_group_response(response: &str) -> Result<Vec<ParsedGroup>, CuratorError> {
    let json_str = strip_fence(response);
    if json_str.is_empty() {
        return Ok(Vec::new());
    }

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| CuratorError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    let items = match json {
        Value::Array(items) => items,
        Value::Object(obj) if obj.contains_key("ids") => vec![Value::Object(obj)],
        Value::Object(obj) => match obj.into_iter().find(|(_, v)| v.is_array()) {
            Some((_, Value::Array(items))) => items,
            _ => Vec::new(),
        },
        Value::Null => Vec::new(),
        _ => {
            return Err(CuratorError::InvalidFormat(
                "Expected a JSON list of groups".to_string(),
            ))
        }
    };

    let mut groups = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let group = match item {
            Value::Array(ids) => ParsedGroup {
                label: None,
                ordinals: ordinals(&ids),
            },
            Value::Object(obj) => ParsedGroup {
                label: obj
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                ordinals: obj
                    .get("ids")
                    .and_then(Value::as_array)
                    .map(|ids| ordinals(ids))
                    .unwrap_or_default(),
            },
            _ => {
                warn!(item = idx, "Skipping malformed group");
                continue;
            }
        };
        groups.push(group);
    }
    Ok(groups)
}

fn ordinals(ids: &[Value]) -> Vec<usize> {
    ids.iter()
        .filter_map(|id| match id {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect()
}

/// Read the verdict from a judgment reply.
///
/// A reply that is just the verdict word wins outright, as does a reply
/// ending with one. Otherwise the reply counts only when it names a single
/// kind of verdict; mentioning both, or neither, is uncertain.
pub fn parse_verdict(response: &str) -> Verdict {
    let words: Vec<Verdict> = response
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .map(verdict_word)
        .collect();

    if let Some(last) = words.last() {
        if *last != Verdict::Uncertain {
            return *last;
        }
    }

    let approves = words.contains(&Verdict::Approve);
    let declines = words.contains(&Verdict::Decline);
    match (approves, declines) {
        (true, false) => Verdict::Approve,
        (false, true) => Verdict::Decline,
        _ => Verdict::Uncertain,
    }
}

fn verdict_word(word: &str) -> Verdict {
    match word.to_ascii_uppercase().as_str() {
        "APPROVED" | "APPROVE" => Verdict::Approve,
        "DECLINED" | "DECLINE" => Verdict::Decline,
        _ => Verdict::Uncertain,
    }
}

fn strip_fence(response: &str) -> &str {
    let trimmed = response.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
            body.rfind("```").map(|end| &body[..end]).unwrap_or(body).trim()
        }
        None => trimmed,
    }
}
