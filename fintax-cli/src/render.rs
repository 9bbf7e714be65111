//! Plain-text views for the terminal.
//!
//! Amounts are rounded to whole won here and nowhere else.

use std::fmt::Write as _;

use fintax_core::calculations::DividendCalculation;
use fintax_core::{FinancialEntryRecord, OtherEntryRecord, TaxBreakdown, TaxMethod, TaxPolicy};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::utils::{format_rate, format_usd, format_won};

const GAUGE_WIDTH: usize = 20;

pub fn method_label(method: TaxMethod) -> &'static str {
    match method {
        TaxMethod::Separate => "separate only (분리과세)",
        TaxMethod::Comprehensive => "comprehensive (종합과세)",
        TaxMethod::FlatFloor => "flat-rate floor (비교과세)",
    }
}

/// `[#####...............]` with the threshold at the midpoint.
fn gauge(percent: Decimal) -> String {
    let filled = (percent * Decimal::from(GAUGE_WIDTH) / Decimal::ONE_HUNDRED)
        .floor()
        .to_usize()
        .unwrap_or(0)
        .min(GAUGE_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(GAUGE_WIDTH - filled))
}

pub fn breakdown(
    breakdown: &TaxBreakdown,
    policy: &TaxPolicy,
) -> String {
    let shown = breakdown.rounded_to_won();
    let percent = breakdown.threshold_gauge_percent(policy);
    let mut out = String::new();

    let _ = writeln!(out, "Tax year {}", policy.tax_year);
    let _ = writeln!(
        out,
        "  Financial income     {:>16}",
        format_won(shown.financial_income_total)
    );
    let _ = writeln!(
        out,
        "  Other income (net)   {:>16}",
        format_won(shown.other_income_total)
    );
    let _ = writeln!(
        out,
        "  Threshold            {:>16}  {} {}%",
        format_won(policy.threshold),
        gauge(percent),
        percent.round_dp(1).normalize()
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  Separate tax         {:>16}", format_won(shown.separate_tax));
    let _ = writeln!(out, "  Progressive tax      {:>16}", format_won(shown.progressive_tax));
    let _ = writeln!(out, "  Total tax            {:>16}", format_won(shown.total_tax));
    let _ = writeln!(out, "  Method               {}", method_label(shown.method));

    if breakdown.is_over_threshold {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "warning: financial income exceeds {} by {}; the excess is taxed together with other income",
            format_won(policy.threshold),
            format_won(shown.excess)
        );
        let _ = writeln!(
            out,
            "  taxable comprehensive income: {}",
            format_won(shown.taxable_comprehensive)
        );
    }
    if breakdown.dependent_status_at_risk() {
        let _ = writeln!(
            out,
            "warning: national health insurance dependent status may be lost"
        );
    }

    out
}

pub fn financial_entries(records: &[FinancialEntryRecord]) -> String {
    if records.is_empty() {
        return "No financial income entries.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:>5}  {:<14} {:>16}  description", "id", "kind", "amount");
    for record in records {
        let kind = format!("{} ({})", record.entry.kind.as_str(), record.entry.kind.label());
        let _ = writeln!(
            out,
            "{:>5}  {:<14} {:>16}  {}",
            record.id,
            kind,
            format_won(record.entry.amount),
            record.entry.description
        );
    }
    out
}

pub fn other_entries(records: &[OtherEntryRecord]) -> String {
    if records.is_empty() {
        return "No other income entries.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:>16} {:>16} {:>16}  description",
        "id", "revenue", "expense", "net"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:>5}  {:>16} {:>16} {:>16}  {}",
            record.id,
            format_won(record.entry.revenue),
            format_won(record.entry.expense),
            format_won(record.entry.net()),
            record.entry.description
        );
    }
    out
}

pub fn policy(policy: &TaxPolicy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tax policy {}", policy.tax_year);
    let _ = writeln!(
        out,
        "  Flat withholding rate   {}",
        format_rate(policy.flat_withholding_rate)
    );
    let _ = writeln!(
        out,
        "  Surcharge multiplier    {}",
        policy.comprehensive_surcharge_rate.normalize()
    );
    let _ = writeln!(out, "  Threshold               {}", format_won(policy.threshold));
    let _ = writeln!(out);
    let _ = writeln!(out, "  {:>16}  {:>6}  {:>14}", "up to", "rate", "deduction");
    for bracket in &policy.brackets {
        let bound = bracket
            .upper_bound
            .map_or_else(|| "-".to_string(), format_won);
        let _ = writeln!(
            out,
            "  {:>16}  {:>6}  {:>14}",
            bound,
            format_rate(bracket.rate),
            format_won(bracket.cumulative_deduction)
        );
    }

    match policy.bracket_gaps() {
        Some(gaps) if gaps.is_empty() => {}
        Some(gaps) => {
            let _ = writeln!(out);
            let _ = writeln!(out, "Schedule discontinuities:");
            for gap in gaps {
                let direction = if gap.gap.is_sign_negative() {
                    "tax drops"
                } else {
                    "tax jumps"
                };
                let _ = writeln!(
                    out,
                    "  at {}: {} by {}",
                    format_won(gap.bound),
                    direction,
                    format_won(gap.gap.abs())
                );
            }
        }
        None => {
            let _ = writeln!(out);
            let _ = writeln!(out, "Schedule discontinuities: n/a (amounts out of range)");
        }
    }
    out
}

pub fn dividend(
    calculation: &DividendCalculation,
    overseas: bool,
) -> String {
    let amount = |d: Decimal| if overseas { format_usd(d) } else { format_won(d) };
    let mut out = String::new();
    let _ = writeln!(out, "  Gross dividend   {:>18}", amount(calculation.gross));
    let _ = writeln!(out, "  Withholding      {:>18}", amount(calculation.withholding));
    let _ = writeln!(out, "  Net dividend     {:>18}", amount(calculation.net));
    out
}
