//! LLM prompt for quote extraction

/// Builds prompts for the LLM to extract quotes from one chunk
pub struct PromptBuilder {
    text: String,
}

impl PromptBuilder {
    /// Create a new prompt builder for `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("Text chunk to analyze:\n");
        prompt.push_str("-----------------------------------\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n-----------------------------------\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You analyse book excerpts and extract notable sayings: quotes, aphorisms, hadith and narrated accounts of what someone said.
Return every saying you find in the text chunk below as a JSON object:

{
  "quote_text": "verbatim text of the saying, in its original language",
  "speaker": "who said it, or \"Unknown\" / \"Narrator\"",
  "context": "one or two sentences on the situation in which it was said",
  "topic": "short theme such as \"Patience\" or \"Knowledge\"",
  "additional_info": {
    "quote_translation": "English translation if quote_text is not English",
    "scripture_reference": "chapter:verse if the saying cites scripture"
  }
}

Rules:
- quote_text must be copied exactly; never paraphrase
- Direct speech, reported speech and statements presented as wisdom all count
- A saying that quotes a verse as part of a larger account is one saying, not two
- Omit additional_info keys that do not apply"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  {"quote_text": "...", "speaker": "...", "context": "...", "topic": "...", "additional_info": {}}
]

If the chunk contains no sayings, return []."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_text() {
        let prompt = PromptBuilder::new("He said: 'Speak good or remain silent.'").build();
        assert!(prompt.contains("Speak good or remain silent."));
        assert!(prompt.contains("quote_text"));
        assert!(prompt.contains("return []"));
    }
}
