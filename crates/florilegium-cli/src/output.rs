//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use florilegium_curator::CurationReport;
use florilegium_domain::{Checkpoint, StatusCounts};
use florilegium_extractor::ExtractionReport;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an extraction report.
    pub fn format_extraction(&self, report: &ExtractionReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut lines = vec![self.key_values(&[
            ("Document", report.document.clone()),
            ("Chunks", report.chunks_total.to_string()),
            ("Resumed", report.chunks_resumed.to_string()),
            ("Processed", report.chunks_processed.to_string()),
            ("Candidates created", report.candidates_created.to_string()),
            ("Duplicates absorbed", report.duplicates_absorbed.to_string()),
            ("Payloads rejected", report.payloads_rejected.to_string()),
            ("Elapsed", format!("{} ms", report.elapsed_ms)),
        ])];

        if report.is_complete() {
            lines.push(self.success("Extraction complete"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Chunk", "Section", "Reason"]);
            for failure in &report.failed_chunks {
                builder.push_record([
                    failure.sequence_index.to_string(),
                    failure.section_id.clone(),
                    failure.reason.clone(),
                ]);
            }
            lines.push(self.table(builder));
            lines.push(self.warning(&format!(
                "{} chunk(s) failed; rerun to resume at chunk {}",
                report.failed_chunks.len(),
                report.failed_indices().first().copied().unwrap_or_default()
            )));
        }
        Ok(lines.join("\n"))
    }

    /// Format a curation report.
    pub fn format_curation(&self, report: &CurationReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut lines = vec![self.key_values(&[
            ("Run", report.run_id.clone()),
            ("Considered", report.candidates_considered.to_string()),
            ("Groups created", report.groups_created.to_string()),
            ("Approved via grouping", report.approved_via_grouping.to_string()),
            ("Approved via judgment", report.approved_via_judgment.to_string()),
            ("  of which uncertain", report.uncertain_resolved.to_string()),
            ("Declined", report.declined.to_string()),
            ("Left pending", report.left_pending.len().to_string()),
        ])];

        if report.grouping_batches_failed > 0 {
            lines.push(self.warning(&format!(
                "{} grouping batch(es) failed; their candidates were judged individually",
                report.grouping_batches_failed
            )));
        }
        if report.is_complete() {
            lines.push(self.success("Curation complete"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Candidate", "Source", "Reason"]);
            for failure in &report.left_pending {
                builder.push_record([
                    failure.candidate_id.clone(),
                    failure.source_identifier.clone(),
                    failure.reason.clone(),
                ]);
            }
            lines.push(self.table(builder));
            lines.push(self.warning("Some candidates are still PENDING; rerun curate"));
        }
        Ok(lines.join("\n"))
    }

    /// Format approval counts.
    pub fn format_status(&self, counts: &StatusCounts, approvals_missing: usize) -> Result<String> {
        if self.format == OutputFormat::Json {
            let value = serde_json::json!({
                "pending": counts.pending,
                "approved": counts.approved,
                "declined": counts.declined,
                "total": counts.total(),
                "approvals_missing": approvals_missing,
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Status", "Candidates"]);
        builder.push_record(["PENDING".to_string(), counts.pending.to_string()]);
        builder.push_record(["APPROVED".to_string(), counts.approved.to_string()]);
        builder.push_record(["DECLINED".to_string(), counts.declined.to_string()]);
        builder.push_record(["Total".to_string(), counts.total().to_string()]);

        let mut output = self.table(builder);
        if approvals_missing > 0 {
            output.push('\n');
            output.push_str(&self.error(&format!(
                "{} candidate(s) have no approval row",
                approvals_missing
            )));
        }
        Ok(output)
    }

    /// Format a document's checkpoint.
    pub fn format_checkpoint(&self, document: &str, checkpoint: Option<&Checkpoint>) -> Result<String> {
        if self.format == OutputFormat::Json {
            let value = serde_json::json!({
                "document": document,
                "unfinished": checkpoint.is_some(),
                "last_processed_chunk_index": checkpoint.map(|c| c.last_processed_chunk_index),
                "updated_at": checkpoint.map(|c| c.updated_at),
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        Ok(match checkpoint {
            Some(c) => self.info(&format!(
                "{}: chunks 0..={} committed, next run resumes at chunk {}",
                document,
                c.last_processed_chunk_index,
                c.last_processed_chunk_index + 1
            )),
            None => self.info(&format!("{}: no unfinished extraction", document)),
        })
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn key_values(&self, rows: &[(&str, String)]) -> String {
        let mut builder = Builder::default();
        for (key, value) in rows {
            builder.push_record([key.to_string(), value.clone()]);
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
