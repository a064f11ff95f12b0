//! Curate command implementation.

use super::{open_store, provider};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use florilegium_curator::{CurationReport, Curator, LlmGroupCapability, LlmJudgeCapability};
use florilegium_domain::traits::LlmProvider;
use florilegium_domain::CapabilityError;

/// Execute the curate command.
pub async fn execute_curate(config: &Config, formatter: &Formatter) -> Result<()> {
    let report = run_curate(config, provider(config)).await?;
    println!("{}", formatter.format_curation(&report)?);

    if !report.is_complete() {
        return Err(CliError::Partial(format!(
            "{} candidate(s) left pending",
            report.left_pending.len()
        )));
    }
    Ok(())
}

/// Curate every PENDING candidate with `provider` and return the report.
pub async fn run_curate<L>(config: &Config, provider: L) -> Result<CurationReport>
where
    L: LlmProvider + Clone + Send + Sync + 'static,
    L::Error: Into<CapabilityError>,
{
    config
        .curator
        .validate()
        .map_err(|e| CliError::Config(format!("[curator] {}", e)))?;

    let store = open_store(&config.database)?;
    let curator = Curator::new(
        LlmGroupCapability::new(provider.clone()),
        LlmJudgeCapability::new(provider),
        store,
        config.curator.clone(),
    )?;
    Ok(curator.run().await?)
}
