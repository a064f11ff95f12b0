//! Status command implementation.

use super::open_store;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use florilegium_domain::traits::CandidateStore;

/// Execute the status command.
pub async fn execute_status(config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(&config.database)?;
    let counts = store.status_counts()?;
    let missing = store.approvals_missing()?;
    println!("{}", formatter.format_status(&counts, missing)?);
    Ok(())
}
