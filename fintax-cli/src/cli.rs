use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fintax_core::calculations::DOMESTIC_DIVIDEND_RATE_PERCENT;

use crate::config::CliOverrides;

/// Estimate Korean tax on interest and dividend income.
///
/// Financial income up to the yearly threshold is withheld at a flat rate.
/// Above it, the excess is taxed together with other income and the larger
/// of the progressive and flat-rate computations applies.
#[derive(Parser, Debug)]
#[command(name = "fintax")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./fintax.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Database path, sqlx URL or :memory:
    #[arg(long = "db", global = true)]
    pub database: Option<String>,

    /// Tax year whose policy is used
    #[arg(short, long, global = true)]
    pub year: Option<i32>,

    /// Log filter, e.g. `info` or `warn,fintax_db_sqlite=debug`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Append log output to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Keep log output off the console
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interest and dividend entries
    #[command(subcommand)]
    Fin(FinancialCommand),

    /// Other taxable income (freelance, business)
    #[command(subcommand)]
    Other(OtherCommand),

    /// Append entries from a CSV file
    Import {
        /// Columns: section,kind,description,amount,revenue,expense
        file: PathBuf,
    },

    /// Remove every entry
    Clear,

    /// Show the tax breakdown for the current entries
    Estimate {
        /// Print the breakdown as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Tax policy for the selected year
    #[command(subcommand)]
    Policy(PolicyCommand),

    /// Dividend after withholding
    Dividend(DividendArgs),
}

#[derive(Subcommand, Debug)]
pub enum FinancialCommand {
    Add {
        /// Amount in won (commas allowed)
        amount: String,

        /// interest, dividend, 이자 or 배당
        #[arg(short, long, default_value = "interest")]
        kind: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },
    List,
    Remove {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum OtherCommand {
    Add {
        /// Revenue in won (commas allowed)
        revenue: String,

        /// Necessary expenses in won
        #[arg(short, long, default_value = "")]
        expense: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },
    List,
    Remove {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Rates, threshold, brackets and schedule discontinuities
    Show,
}

#[derive(Args, Debug)]
pub struct DividendArgs {
    /// Number of shares held
    #[arg(long)]
    pub shares: String,

    /// Dividend per share
    #[arg(long)]
    pub per_share: String,

    /// Withholding rate in percent
    #[arg(long, default_value_t = DOMESTIC_DIVIDEND_RATE_PERCENT.to_string())]
    pub rate: String,

    /// Amounts are in USD
    #[arg(long, default_value_t = false)]
    pub overseas: bool,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            backend: self.backend.clone(),
            database: self.database.clone(),
            tax_year: self.year,
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
            quiet: self.quiet,
        }
    }
}
