//! Checkpoint command implementation.

use super::{document_key, open_store};
use crate::cli::{CheckpointAction, CheckpointArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use florilegium_domain::traits::CandidateStore;

/// Execute the checkpoint command.
pub async fn execute_checkpoint(args: CheckpointArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut store = open_store(&config.database)?;

    match args.action {
        CheckpointAction::Show { file } => {
            let document = document_key(&file);
            let checkpoint = store.load_checkpoint(&document)?;
            println!("{}", formatter.format_checkpoint(&document, checkpoint.as_ref())?);
        }
        CheckpointAction::Clear { file } => {
            let document = document_key(&file);
            if store.clear_checkpoint(&document)? {
                println!("{}", formatter.success(&format!("Checkpoint cleared for {}", document)));
            } else {
                println!("{}", formatter.info(&format!("{}: no checkpoint to clear", document)));
            }
        }
    }
    Ok(())
}
