//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Florilegium - extract and curate quotes from books.
#[derive(Debug, Parser)]
#[command(name = "florilegium")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database, overriding the configured one
    #[arg(long, global = true, env = "FLORILEGIUM_DB")]
    pub db: Option<PathBuf>,

    /// Ollama model, overriding the configured one
    #[arg(long, global = true, env = "FLORILEGIUM_MODEL")]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract candidate quotes from a text file
    Extract(ExtractArgs),

    /// Group and judge all PENDING candidates
    Curate,

    /// Inspect or reset a document's checkpoint
    Checkpoint(CheckpointArgs),

    /// Show candidate counts per approval status
    Status,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// UTF-8 text file; lines starting with '#' open a new section
    pub file: PathBuf,

    /// Maximum chunk size in characters
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// Overlap between chunks in characters
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Stop at the first chunk that fails after retries
    #[arg(long)]
    pub abort_on_failure: bool,
}

/// Arguments for checkpoint management.
#[derive(Debug, Parser)]
pub struct CheckpointArgs {
    #[command(subcommand)]
    pub action: CheckpointAction,
}

/// Checkpoint actions.
#[derive(Debug, Subcommand)]
pub enum CheckpointAction {
    /// Show where an unfinished extraction would resume
    Show {
        /// Document path
        file: PathBuf,
    },

    /// Forget the checkpoint so the next extraction starts over
    Clear {
        /// Document path
        file: PathBuf,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from([
            "florilegium",
            "--db",
            "quotes.db",
            "extract",
            "book.txt",
            "--max-chunk-size",
            "8000",
            "--abort-on-failure",
        ]);
        assert_eq!(cli.db, Some(PathBuf::from("quotes.db")));
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.file, PathBuf::from("book.txt"));
                assert_eq!(args.max_chunk_size, Some(8000));
                assert_eq!(args.overlap, None);
                assert!(args.abort_on_failure);
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_checkpoint_command() {
        let cli = Cli::parse_from(["florilegium", "checkpoint", "clear", "book.txt", "-f", "json"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        match cli.command {
            Command::Checkpoint(CheckpointArgs {
                action: CheckpointAction::Clear { file },
            }) => assert_eq!(file, PathBuf::from("book.txt")),
            _ => panic!("Expected Checkpoint clear"),
        }
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["florilegium"]).is_err());
    }
}
