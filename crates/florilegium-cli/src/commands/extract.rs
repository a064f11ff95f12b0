//! Extract command implementation.

use super::{document_key, open_store, provider};
use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::reader::TextDocumentReader;
use florilegium_domain::traits::{DocumentReader, LlmProvider};
use florilegium_domain::CapabilityError;
use florilegium_extractor::{
    ExtractionReport, Extractor, ExtractorConfig, FailurePolicy, LlmExtractCapability,
};
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let report = run_extract(&args, config, provider(config)).await?;
    println!("{}", formatter.format_extraction(&report)?);

    if !report.is_complete() {
        return Err(CliError::Partial(format!(
            "chunk(s) {:?} of {} failed",
            report.failed_indices(),
            report.document
        )));
    }
    Ok(())
}

/// Extract candidates from `args.file` with `provider` and return the report.
pub async fn run_extract<L>(args: &ExtractArgs, config: &Config, provider: L) -> Result<ExtractionReport>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Into<CapabilityError>,
{
    let extractor_config = effective_config(args, &config.extractor)?;

    let sections = TextDocumentReader.read_sections(&args.file)?;
    let document = document_key(&args.file);
    info!(document = %document, sections = sections.len(), "Document loaded");

    let store = open_store(&config.database)?;
    let extractor = Extractor::new(LlmExtractCapability::new(provider), store, extractor_config)?;
    if extractor.has_unfinished_work(&document)? {
        info!(document = %document, "Resuming unfinished extraction");
    }
    Ok(extractor.run(&document, &sections).await?)
}

/// Apply command-line overrides to the configured extractor settings.
fn effective_config(args: &ExtractArgs, base: &ExtractorConfig) -> Result<ExtractorConfig> {
    let mut config = base.clone();
    if let Some(max) = args.max_chunk_size {
        config.max_chunk_size = max;
        config.boundary_tolerance = config.boundary_tolerance.min(max);
    }
    if let Some(overlap) = args.overlap {
        config.overlap_size = Some(overlap);
    }
    if args.abort_on_failure {
        config.on_chunk_failure = FailurePolicy::Abort;
    }
    config.validate().map_err(CliError::Config)?;
    Ok(config)
}
