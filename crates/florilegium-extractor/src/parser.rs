//! Parse LLM output into candidate payloads
//!
//! Generators are loose with formatting. The parser accepts a list of
//! objects, a single object, or an object wrapping the list under one key,
//! with or without a markdown code fence around it.

use crate::error::ExtractorError;
use florilegium_domain::{AdditionalInfo, CandidatePayload};
use serde_json::{Map, Value};
use tracing::warn;

/// Parse an extraction response into payloads.
///
/// An empty response is an empty list. Items that are not JSON objects are
/// skipped. A missing `quote_text` yields an empty quote, which the
/// extractor rejects and counts.
pub fn parse_extraction_response(response: &str) -> Result<Vec<CandidatePayload>, ExtractorError> {
    let json_str = extract_json(response);
    if json_str.is_empty() {
        return Ok(Vec::new());
    }

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    let items = match json {
        Value::Array(items) => items,
        Value::Object(obj) => unwrap_object(obj),
        Value::Null => Vec::new(),
        other => {
            return Err(ExtractorError::InvalidFormat(format!(
                "Expected a JSON list or object, got {}",
                kind(&other)
            )))
        }
    };

    let mut payloads = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(obj) => payloads.push(payload_from_object(sanitize_keys(obj))),
            other => warn!(item = idx, kind = kind(&other), "Skipping non-object item"),
        }
    }
    Ok(payloads)
}

/// Strip a surrounding markdown code fence and surrounding prose
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    let unfenced = match trimmed.strip_prefix("```") {
        Some(rest) => {
            // Drop the info string ("json") on the opening line
            let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
            match body.rfind("```") {
                Some(end) => &body[..end],
                None => body,
            }
        }
        None => trimmed,
    }
    .trim();

    if unfenced.starts_with('[') || unfenced.starts_with('{') || unfenced.is_empty() {
        return unfenced;
    }

    // Prose around the payload: take the outermost bracketed span
    let open = unfenced.find(['[', '{']);
    let close = unfenced.rfind([']', '}']);
    match (open, close) {
        (Some(start), Some(end)) if end > start => &unfenced[start..=end],
        _ => unfenced,
    }
}

/// A single object is one payload, unless it only wraps the list
fn unwrap_object(obj: Map<String, Value>) -> Vec<Value> {
    let looks_like_payload = obj
        .keys()
        .any(|k| clean_key(k) == "quote_text");
    if !looks_like_payload {
        let mut arrays = obj.values().filter(|v| v.is_array());
        if let (Some(Value::Array(list)), None) = (arrays.next(), arrays.next()) {
            return list.clone();
        }
    }
    vec![Value::Object(obj)]
}

fn clean_key(key: &str) -> String {
    key.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
        .to_string()
}

fn sanitize_keys(obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter().map(|(k, v)| (clean_key(&k), v)).collect()
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        other => Some(other.to_string()),
    }
}

fn payload_from_object(obj: Map<String, Value>) -> CandidatePayload {
    CandidatePayload {
        quote_text: text_field(&obj, "quote_text").unwrap_or_default(),
        speaker: text_field(&obj, "speaker"),
        context: text_field(&obj, "context"),
        topic: text_field(&obj, "topic"),
        additional_info: obj
            .get("additional_info")
            .map(parse_additional_info)
            .unwrap_or_default(),
    }
}

/// `additional_info` arrives as an object, as a JSON-encoded object inside a
/// string, or as free text
fn parse_additional_info(value: &Value) -> AdditionalInfo {
    match value {
        Value::Object(obj) => info_from_object(obj),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(obj)) => info_from_object(&obj),
            _ => {
                let mut info = AdditionalInfo::default();
                if !s.trim().is_empty() {
                    info.extra.insert("notes".to_string(), s.trim().to_string());
                }
                info
            }
        },
        _ => AdditionalInfo::default(),
    }
}

fn info_from_object(obj: &Map<String, Value>) -> AdditionalInfo {
    let mut info = AdditionalInfo::default();
    for (key, value) in obj {
        let text = match value {
            Value::Null => continue,
            Value::String(s) if s.trim().is_empty() => continue,
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        match clean_key(key).as_str() {
            "quote_translation" => info.quote_translation = Some(text),
            "scripture_reference" | "surah" => info.scripture_reference = Some(text),
            other => {
                info.extra.insert(other.to_string(), text);
            }
        }
    }
    info
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let response = r#"[
            {
                "quote_text": "Whoever is not grateful to people is not grateful to God.",
                "speaker": "The Prophet",
                "context": "On gratitude",
                "topic": "Gratitude"
            }
        ]"#;

        let payloads = parse_extraction_response(response).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].speaker.as_deref(), Some("The Prophet"));
        assert_eq!(payloads[0].topic.as_deref(), Some("Gratitude"));
    }

    #[test]
    fn test_parse_with_markdown_wrapper() {
        let response = "```json\n[{\"quote_text\": \"Silence is wisdom.\"}]\n```";
        let payloads = parse_extraction_response(response).unwrap();
        assert_eq!(payloads[0].quote_text, "Silence is wisdom.");
    }

    #[test]
    fn test_single_object_becomes_list() {
        let response = r#"{"quote_text": "Silence is wisdom.", "speaker": "Luqman"}"#;
        let payloads = parse_extraction_response(response).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].speaker.as_deref(), Some("Luqman"));
    }

    #[test]
    fn test_object_wrapping_list_is_unwrapped() {
        let response = r#"{"quotes": [{"quote_text": "a"}, {"quote_text": "b"}]}"#;
        let payloads = parse_extraction_response(response).unwrap();
        assert_eq!(payloads.len(), 2);
    }

    #[test]
    fn test_empty_response_is_empty_list() {
        assert!(parse_extraction_response("").unwrap().is_empty());
        assert!(parse_extraction_response("  \n ").unwrap().is_empty());
        assert!(parse_extraction_response("[]").unwrap().is_empty());
        assert!(parse_extraction_response("```json\n[]\n```").unwrap().is_empty());
    }

    #[test]
    fn test_prose_around_json() {
        let response = "Here are the quotes:\n[{\"quote_text\": \"Be just.\"}]\nHope this helps.";
        let payloads = parse_extraction_response(response).unwrap();
        assert_eq!(payloads[0].quote_text, "Be just.");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let result = parse_extraction_response("This is not JSON");
        assert!(matches!(result, Err(ExtractorError::InvalidFormat(_))));
    }

    #[test]
    fn test_non_object_items_are_skipped() {
        let response = r#"["stray", {"quote_text": "kept"}, 3]"#;
        let payloads = parse_extraction_response(response).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].quote_text, "kept");
    }

    #[test]
    fn test_keys_are_sanitized() {
        let response = r#"[{" \"quote_text\" ": "Trim me.", "'topic'": "Keys"}]"#;
        let payloads = parse_extraction_response(response).unwrap();
        assert_eq!(payloads[0].quote_text, "Trim me.");
        assert_eq!(payloads[0].topic.as_deref(), Some("Keys"));
    }

    #[test]
    fn test_missing_quote_text_yields_empty_quote() {
        let payloads = parse_extraction_response(r#"[{"speaker": "Unknown"}]"#).unwrap();
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].validate().is_err());
    }

    #[test]
    fn test_additional_info_as_object() {
        let response = r#"[{
            "quote_text": "إنما الأعمال بالنيات",
            "additional_info": {"quote_translation": "Deeds are by intentions", "surah": "none", "grade": "sahih"}
        }]"#;
        let info = &parse_extraction_response(response).unwrap()[0].additional_info;
        assert_eq!(info.quote_translation.as_deref(), Some("Deeds are by intentions"));
        assert_eq!(info.scripture_reference.as_deref(), Some("none"));
        assert_eq!(info.extra["grade"], "sahih");
    }

    #[test]
    fn test_additional_info_as_encoded_string() {
        let response = r#"[{
            "quote_text": "q",
            "additional_info": "{\"scripture_reference\": \"2:255\"}"
        }]"#;
        let info = &parse_extraction_response(response).unwrap()[0].additional_info;
        assert_eq!(info.scripture_reference.as_deref(), Some("2:255"));
    }

    #[test]
    fn test_additional_info_as_free_text() {
        let response = r#"[{"quote_text": "q", "additional_info": "Said in reply to a question."}]"#;
        let info = &parse_extraction_response(response).unwrap()[0].additional_info;
        assert_eq!(info.extra["notes"], "Said in reply to a question.");
    }
}
