//! End-to-end command runs against a seeded in-memory SQLite store.

use clap::Parser;
use fintax_cli::app;
use fintax_cli::cli::Cli;
use fintax_cli::config::{AppConfig, Settings};
use fintax_core::db::DbConfig;
use fintax_core::{IncomeRepository, TaxBreakdown, TaxMethod};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

async fn memory_repo() -> Box<dyn IncomeRepository> {
    app::build_registry()
        .create(&DbConfig::default())
        .await
        .expect("Failed to create in-memory repository")
}

fn settings(config: &str) -> Settings {
    AppConfig::from_toml_str(config)
        .expect("Failed to parse config")
        .resolve(&Default::default())
}

async fn run(
    repo: &dyn IncomeRepository,
    settings: &Settings,
    args: &[&str],
) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("fintax").chain(args.iter().copied()))?;
    let mut out = Vec::new();
    app::execute(&cli.command, settings, repo, &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[tokio::test]
async fn entries_added_through_commands_drive_the_estimate() {
    let repo = memory_repo().await;
    let settings = settings("");

    let added = run(repo.as_ref(), &settings, &["fin", "add", "15,000,000", "-d", "deposit"])
        .await
        .unwrap();
    assert_eq!(added, "Added financial entry #1.\n");
    run(repo.as_ref(), &settings, &["fin", "add", "15000000", "-k", "배당"])
        .await
        .unwrap();

    let json = run(repo.as_ref(), &settings, &["estimate", "--json"]).await.unwrap();
    let breakdown: TaxBreakdown = serde_json::from_str(&json).unwrap();

    assert_eq!(breakdown.separate_tax, dec!(3080000));
    assert_eq!(breakdown.progressive_tax, dec!(1540000));
    assert_eq!(breakdown.total_tax, dec!(4620000));
    assert_eq!(breakdown.method, TaxMethod::FlatFloor);
}

#[tokio::test]
async fn text_estimate_warns_over_threshold() {
    let repo = memory_repo().await;
    let settings = settings("");
    run(repo.as_ref(), &settings, &["fin", "add", "30000000"]).await.unwrap();

    let text = run(repo.as_ref(), &settings, &["estimate"]).await.unwrap();

    assert!(text.contains("4,620,000원"), "got:\n{text}");
    assert!(text.contains("warning:"));
}

#[tokio::test]
async fn invalid_form_is_rejected_without_storing() {
    let repo = memory_repo().await;
    let settings = settings("");

    let err = run(repo.as_ref(), &settings, &["other", "add", "100", "-e", "150"])
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Expense"), "got: {err}");
    assert!(repo.list_other_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_and_clear() {
    let repo = memory_repo().await;
    let settings = settings("");
    run(repo.as_ref(), &settings, &["other", "add", "30,000,000", "-e", "12,000,000"])
        .await
        .unwrap();
    run(repo.as_ref(), &settings, &["fin", "add", "1000"]).await.unwrap();

    let listed = run(repo.as_ref(), &settings, &["other", "list"]).await.unwrap();
    assert!(listed.contains("18,000,000원"), "got:\n{listed}");

    run(repo.as_ref(), &settings, &["other", "remove", "1"]).await.unwrap();
    assert!(run(repo.as_ref(), &settings, &["other", "remove", "1"]).await.is_err());

    run(repo.as_ref(), &settings, &["clear"]).await.unwrap();
    let listed = run(repo.as_ref(), &settings, &["fin", "list"]).await.unwrap();
    assert_eq!(listed, "No financial income entries.\n");
}

#[tokio::test]
async fn import_reads_csv_file() {
    let repo = memory_repo().await;
    let settings = settings("");
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../fintax-data/test-data/entries.csv");

    let output = run(repo.as_ref(), &settings, &["import", path]).await.unwrap();

    assert_eq!(output, "Imported 4 entries (2 financial, 2 other).\n");
    assert_eq!(repo.list_financial_entries().await.unwrap().len(), 2);
}

#[tokio::test]
async fn config_overrides_reach_the_estimate() {
    let repo = memory_repo().await;
    let settings = settings("[policy]\nthreshold = \"10000000\"\n");
    run(repo.as_ref(), &settings, &["fin", "add", "15000000"]).await.unwrap();

    let json = run(repo.as_ref(), &settings, &["estimate", "--json"]).await.unwrap();
    let breakdown: TaxBreakdown = serde_json::from_str(&json).unwrap();

    assert!(breakdown.is_over_threshold);
    assert_eq!(breakdown.separate_tax, dec!(1540000));
    assert_eq!(breakdown.excess, dec!(5000000));
}

#[tokio::test]
async fn invalid_override_is_reported() {
    let repo = memory_repo().await;
    let settings = settings("[policy]\nthreshold = \"-1\"\n");

    let err = run(repo.as_ref(), &settings, &["policy", "show"]).await.unwrap_err();

    assert!(err.to_string().contains("invalid"), "got: {err}");
}

#[tokio::test]
async fn unseeded_year_falls_back_to_defaults() {
    let repo = memory_repo().await;
    let settings = settings("tax_year = 2031\n");

    let text = run(repo.as_ref(), &settings, &["policy", "show"]).await.unwrap();

    assert!(text.starts_with("Tax policy 2031"), "got:\n{text}");
    assert!(text.contains("tax drops by 100,000원"));
}

#[tokio::test]
async fn dividend_runs_without_a_store() {
    let settings = settings("[database]\nbackend = \"nonexistent\"\n");
    let cli = Cli::try_parse_from([
        "fintax",
        "dividend",
        "--shares",
        "30",
        "--per-share",
        "0.24",
        "--rate",
        "15",
        "--overseas",
    ])
    .unwrap();
    let mut out = Vec::new();

    app::run(&cli.command, &settings, &app::build_registry(), &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("7.20 USD"), "got:\n{text}");
    assert!(text.contains("6.12 USD"));
}

#[tokio::test]
async fn unknown_backend_fails_to_open() {
    let settings = settings("[database]\nbackend = \"nonexistent\"\n");
    let cli = Cli::try_parse_from(["fintax", "fin", "list"]).unwrap();
    let mut out = Vec::new();

    let err = app::run(&cli.command, &settings, &app::build_registry(), &mut out)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("unknown backend 'nonexistent'"), "got: {err:#}");
}

#[tokio::test]
async fn estimate_renders_against_a_threshold_near_decimal_limits() {
    let repo = memory_repo().await;
    let settings = settings("[policy]\nthreshold = \"50000000000000000000000000000\"\n");
    run(repo.as_ref(), &settings, &["fin", "add", "1000"]).await.unwrap();

    let text = run(repo.as_ref(), &settings, &["estimate"]).await.unwrap();

    assert!(text.contains("50,000,000,000,000,000,000,000,000,000원"), "got:\n{text}");
    assert!(text.contains("] 0%"));
    assert!(!text.contains("warning:"));
}

#[tokio::test]
async fn policy_show_reports_unrepresentable_gaps() {
    let repo = memory_repo().await;
    let settings = settings(
        r#"
[[policy.brackets]]
upper_bound = "50000000000000000000000000000"
rate = "2"
cumulative_deduction = "0"

[[policy.brackets]]
rate = "2"
cumulative_deduction = "0"
"#,
    );

    let text = run(repo.as_ref(), &settings, &["policy", "show"]).await.unwrap();

    assert!(text.contains("200%"), "got:\n{text}");
    assert!(text.contains("Schedule discontinuities: n/a"));
}
