//! Command implementations.

pub mod checkpoint;
pub mod curate;
pub mod extract;
pub mod status;

pub use self::checkpoint::execute_checkpoint;
pub use self::curate::{execute_curate, run_curate};
pub use self::extract::{execute_extract, run_extract};
pub use self::status::execute_status;

use crate::config::Config;
use crate::error::Result;
use florilegium_llm::OllamaProvider;
use florilegium_store::SqliteStore;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Open the configured database, creating its directory on first use.
pub fn open_store(database: &Path) -> Result<SqliteStore> {
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(SqliteStore::new(database)?)
}

/// Checkpoint key for a document: its canonical path when it exists.
pub fn document_key(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// Ollama provider from the `[llm]` section.
pub fn provider(config: &Config) -> OllamaProvider {
    OllamaProvider::with_timeout(
        &config.llm.endpoint,
        &config.llm.model,
        Duration::from_secs(config.llm.request_timeout_secs),
    )
}
