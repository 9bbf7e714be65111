use std::io::Write;

use anyhow::{Context, Result};
use fintax_core::calculations::calculate_dividend;
use fintax_core::db::RepositoryRegistry;
use fintax_core::{IncomeRepository, RepositoryError, TaxPolicy};
use fintax_data::entry_loader;
use fintax_db_sqlite::SqliteRepositoryFactory;
use tracing::{info, warn};

use crate::cli::{Command, DividendArgs, FinancialCommand, OtherCommand, PolicyCommand};
use crate::config::{PolicyOverrides, Settings};
use crate::forms::{FinancialEntryForm, OtherEntryForm};
use crate::render;
use crate::state::IncomeBook;
use crate::utils::parse_decimal;

/// Every storage backend this binary knows about.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// The policy estimates run against: the stored policy for `tax_year`,
/// or the built-in one if none is stored, with config overrides on top.
pub async fn resolve_policy(
    repo: &dyn IncomeRepository,
    tax_year: i32,
    overrides: &PolicyOverrides,
) -> Result<TaxPolicy> {
    let stored = match repo.get_tax_policy(tax_year).await {
        Ok(policy) => policy,
        Err(RepositoryError::NotFound) => {
            warn!(tax_year, "no stored policy for year, using built-in defaults");
            TaxPolicy::default_for_year(tax_year)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load tax policy for {tax_year}"));
        }
    };

    let policy = overrides.apply(stored);
    if !overrides.is_empty() {
        info!(tax_year, "config policy overrides applied");
    }
    policy
        .validate()
        .with_context(|| format!("Tax policy for {tax_year} is invalid"))?;
    Ok(policy)
}

/// Runs one command. Only commands that touch entries or policies open
/// the store.
pub async fn run(
    command: &Command,
    settings: &Settings,
    registry: &RepositoryRegistry,
    out: &mut dyn Write,
) -> Result<()> {
    if let Command::Dividend(args) = command {
        return dividend(args, out);
    }

    let repo = registry
        .create(&settings.db)
        .await
        .with_context(|| {
            format!(
                "Failed to open {} database '{}'",
                settings.db.backend, settings.db.connection_string
            )
        })?;
    execute(command, settings, repo.as_ref(), out).await
}

/// Runs one command against an open store.
pub async fn execute(
    command: &Command,
    settings: &Settings,
    repo: &dyn IncomeRepository,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Fin(sub) => financial(sub, repo, out).await,
        Command::Other(sub) => other(sub, repo, out).await,
        Command::Import { file } => {
            let imported = entry_loader::load_from_file(file)
                .with_context(|| format!("Failed to import '{}'", file.display()))?;
            let mut book = IncomeBook::load(repo).await.context("Failed to load entries")?;
            let count = book.import(&imported).await.context("Failed to store entries")?;
            writeln!(
                out,
                "Imported {count} entries ({} financial, {} other).",
                imported.financial.len(),
                imported.other.len()
            )?;
            Ok(())
        }
        Command::Clear => {
            let mut book = IncomeBook::load(repo).await.context("Failed to load entries")?;
            book.clear().await.context("Failed to clear entries")?;
            writeln!(out, "All entries removed.")?;
            Ok(())
        }
        Command::Estimate { json } => {
            let policy = resolve_policy(repo, settings.tax_year, &settings.policy).await?;
            let book = IncomeBook::load(repo).await.context("Failed to load entries")?;
            let breakdown = book.estimate(&policy).context("Estimate failed")?;
            if *json {
                serde_json::to_writer_pretty(&mut *out, &breakdown)?;
                writeln!(out)?;
            } else {
                write!(out, "{}", render::breakdown(&breakdown, &policy))?;
            }
            Ok(())
        }
        Command::Policy(PolicyCommand::Show) => {
            let policy = resolve_policy(repo, settings.tax_year, &settings.policy).await?;
            write!(out, "{}", render::policy(&policy))?;
            Ok(())
        }
        Command::Dividend(args) => dividend(args, out),
    }
}

async fn financial(
    command: &FinancialCommand,
    repo: &dyn IncomeRepository,
    out: &mut dyn Write,
) -> Result<()> {
    let mut book = IncomeBook::load(repo).await.context("Failed to load entries")?;
    match command {
        FinancialCommand::Add {
            amount,
            kind,
            description,
        } => {
            let form = FinancialEntryForm {
                kind: kind.clone(),
                description: description.clone(),
                amount: amount.clone(),
            };
            let entry = form.validate()?;
            let record = book
                .add_financial(&entry)
                .await
                .context("Failed to save financial entry")?;
            writeln!(out, "Added financial entry #{}.", record.id)?;
        }
        FinancialCommand::List => write!(out, "{}", render::financial_entries(book.financial()))?,
        FinancialCommand::Remove { id } => {
            book.remove_financial(*id)
                .await
                .with_context(|| format!("Failed to remove financial entry #{id}"))?;
            writeln!(out, "Removed financial entry #{id}.")?;
        }
    }
    Ok(())
}

async fn other(
    command: &OtherCommand,
    repo: &dyn IncomeRepository,
    out: &mut dyn Write,
) -> Result<()> {
    let mut book = IncomeBook::load(repo).await.context("Failed to load entries")?;
    match command {
        OtherCommand::Add {
            revenue,
            expense,
            description,
        } => {
            let form = OtherEntryForm {
                description: description.clone(),
                revenue: revenue.clone(),
                expense: expense.clone(),
            };
            let entry = form.validate()?;
            let record = book
                .add_other(&entry)
                .await
                .context("Failed to save other-income entry")?;
            writeln!(out, "Added other-income entry #{}.", record.id)?;
        }
        OtherCommand::List => write!(out, "{}", render::other_entries(book.other()))?,
        OtherCommand::Remove { id } => {
            book.remove_other(*id)
                .await
                .with_context(|| format!("Failed to remove other-income entry #{id}"))?;
            writeln!(out, "Removed other-income entry #{id}.")?;
        }
    }
    Ok(())
}

fn dividend(
    args: &DividendArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let shares = parse_decimal(&args.shares).context("--shares")?;
    let per_share = parse_decimal(&args.per_share).context("--per-share")?;
    let rate = parse_decimal(&args.rate).context("--rate")?;

    let calculation = calculate_dividend(shares, per_share, rate)?;
    write!(out, "{}", render::dividend(&calculation, args.overseas))?;
    Ok(())
}
