//! Florilegium CLI library.
//!
//! Configuration, document reading, command execution and output
//! formatting for the `florilegium` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod reader;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use reader::TextDocumentReader;
