//! Plain-text document reader.

use florilegium_domain::traits::DocumentReader;
use florilegium_domain::Section;
use std::fs;
use std::path::Path;

/// Reads a UTF-8 text file as ordered sections.
///
/// A line starting with `#` opens a new section named by the heading text.
/// Text before the first heading belongs to `Section 1`. Sections with no
/// text are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDocumentReader;

impl DocumentReader for TextDocumentReader {
    type Error = std::io::Error;

    fn read_sections(&self, path: &Path) -> Result<Vec<Section>, Self::Error> {
        let text = fs::read_to_string(path)?;
        Ok(parse_sections(&text))
    }
}

/// Split `text` into sections at markdown-style headings.
pub fn parse_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading = String::from("Section 1");
    let mut body = String::new();

    for line in text.lines() {
        match line.strip_prefix('#') {
            Some(title) => {
                push_section(&mut sections, &heading, &body);
                heading = title.trim_start_matches('#').trim().to_string();
                if heading.is_empty() {
                    heading = format!("Section {}", sections.len() + 1);
                }
                body.clear();
            }
            None => {
                body.push_str(line);
                body.push('\n');
            }
        }
    }
    push_section(&mut sections, &heading, &body);
    sections
}

fn push_section(sections: &mut Vec<Section>, heading: &str, body: &str) {
    let body = body.trim();
    if !body.is_empty() {
        sections.push(Section::new(heading, body));
    }
}
