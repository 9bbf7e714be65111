use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fintax_data::ProgressiveBracketLoader;
use fintax_db_sqlite::SqliteRepository;

/// Replace progressive bracket schedules from a CSV file.
///
/// Columns: `tax_year,upper_bound,rate,cumulative_deduction`. Leave
/// `upper_bound` empty for the top bracket. Every year in the file must
/// already have a policy row (see `--seeds`), and its brackets are replaced
/// as a whole.
#[derive(Parser, Debug)]
#[command(name = "fintax-policy-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Bracket CSV file
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL (created if missing)
    #[arg(short, long, default_value = "sqlite:fintax.db")]
    database: String,

    /// Apply schema migrations first
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run the seed SQL files in this directory before loading
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

async fn prepare(args: &Args) -> Result<SqliteRepository> {
    let repo = SqliteRepository::new(&args.database).await?;

    if args.migrate {
        repo.run_migrations().await?;
        println!("Schema is up to date.");
    }
    if let Some(dir) = &args.seeds {
        repo.run_seeds(dir).await?;
        println!("Seeds applied from {}.", dir.display());
    }
    Ok(repo)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let repo = prepare(&args).await?;

    let file = File::open(&args.file)
        .with_context(|| format!("Cannot open bracket file '{}'", args.file.display()))?;
    let records = ProgressiveBracketLoader::parse(file)
        .with_context(|| format!("Cannot parse bracket file '{}'", args.file.display()))?;

    let inserted = ProgressiveBracketLoader::load(&repo, &records)
        .await
        .context("Bracket schedule was not stored")?;

    println!(
        "Stored {inserted} brackets from {} ({} rows read).",
        args.file.display(),
        records.len()
    );
    Ok(())
}
