use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use fintax_cli::app;
use fintax_cli::cli::Cli;
use fintax_cli::config::AppConfig;
use fintax_cli::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::discover(cli.config.as_deref())?;
    let settings = config.resolve(&cli.overrides());

    logging::init_logging(
        settings.log_level.as_deref(),
        settings.log_console,
        settings.log_file.as_deref(),
    )
    .context("Failed to initialize logging")?;
    tracing::debug!(
        backend = %settings.db.backend,
        database = %settings.db.connection_string,
        tax_year = settings.tax_year,
        "settings resolved"
    );

    let registry = app::build_registry();
    let mut stdout = io::stdout().lock();
    app::run(&cli.command, &settings, &registry, &mut stdout).await
}
