//! LLM prompts for grouping and judging candidates

use florilegium_domain::Candidate;
use serde_json::{json, Value};

/// Build the grouping prompt. Candidates are numbered 1..n in batch order;
/// the reply refers to them by that number.
pub fn group_prompt(batch: &[Candidate]) -> String {
    let quotes: Vec<Value> = batch
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let mut quote = quote_json(candidate);
            quote["id"] = json!(idx + 1);
            quote
        })
        .collect();
    let quotes = serde_json::to_string_pretty(&quotes).unwrap_or_else(|_| "[]".to_string());

    format!("{}\n\nQuotes to analyze:\n{}\n\n{}", GROUP_INSTRUCTIONS, quotes, GROUP_OUTPUT_FORMAT)
}

/// Build the judgment prompt for a single candidate
pub fn judge_prompt(candidate: &Candidate) -> String {
    let quote = quote_json(candidate).to_string();
    format!("{}\n\nQuote to judge:\n{}\n\n{}", JUDGE_INSTRUCTIONS, quote, JUDGE_OUTPUT_FORMAT)
}

fn quote_json(candidate: &Candidate) -> Value {
    json!({
        "quote_text": candidate.quote_text,
        "speaker": candidate.speaker,
        "context": candidate.context,
        "topic": candidate.topic,
    })
}

const GROUP_INSTRUCTIONS: &str = r#"You check a list of consecutive quotes taken from one book for narrative continuity.
Group quotes that are parts of the same dialogue or story: same speaker or conversation, same topic and context, and text that reads as a continuation.
Do not group quotes on different topics, from unrelated speakers, or that do not form a coherent whole. A quote belongs to at most one group."#;

const GROUP_OUTPUT_FORMAT: &str = r#"Output format (JSON array only, no additional text):
[
  {"label": "short-kebab-case-name", "ids": [1, 2]}
]

Example: two quotes where a man asks "What is faith?" and a sage answers "To believe in the unseen." give
[{"label": "question-on-faith", "ids": [1, 2]}]

If no quotes belong together, return []."#;

const JUDGE_INSTRUCTIONS: &str = r#"You decide whether an extracted quote is worth keeping as a saying.
Rules:
- A saying, aphorism, hadith or narrated account of what someone said is APPROVED
- An account that contains a scripture verse as part of its narrative is APPROVED
- Text that is only a scripture verse, with nothing said around it, is DECLINED
- A fragment that carries no meaning on its own is DECLINED"#;

const JUDGE_OUTPUT_FORMAT: &str = r#"Answer with a single word: APPROVED or DECLINED.
Example: "The best of you are those who are best to their families." said by the Prophet is APPROVED.
Example: "In the name of God, the Most Gracious, the Most Merciful" on its own is DECLINED."#;
