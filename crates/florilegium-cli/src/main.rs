//! Florilegium CLI - extract and curate quotes from books.

use clap::Parser;
use florilegium_cli::commands;
use florilegium_cli::config::OutputFormat;
use florilegium_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so that stdout stays parseable with --format json
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let color = !cli.no_color;
    if let Err(e) = run(cli).await {
        let formatter = Formatter::new(OutputFormat::Table, color);
        eprintln!("{}", formatter.error(&e.to_string()));
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> florilegium_cli::Result<()> {
    // Load config; a missing file means defaults
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(db) = cli.db {
        config.database = db;
    }
    if let Some(model) = cli.model {
        config.llm.model = model;
    }

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &config, &formatter).await,
        Command::Curate => commands::execute_curate(&config, &formatter).await,
        Command::Checkpoint(args) => commands::execute_checkpoint(args, &config, &formatter).await,
        Command::Status => commands::execute_status(&config, &formatter).await,
    }
}
