use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Combined national and local withholding rate on financial income (15.4%).
pub const FLAT_WITHHOLDING_RATE: Decimal = dec!(0.154);

/// Multiplier adding the 10% local surtax to the national differential tax.
pub const COMPREHENSIVE_SURCHARGE_RATE: Decimal = dec!(1.1);

/// Annual financial income above which comprehensive taxation applies (KRW).
pub const THRESHOLD: Decimal = dec!(20000000);

pub const DEFAULT_TAX_YEAR: i32 = 2025;

/// One row of the progressive schedule.
///
/// Tax for an amount falling in this bracket is
/// `amount * rate - cumulative_deduction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveBracket {
    /// Inclusive upper bound; `None` for the open-ended top bracket.
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub cumulative_deduction: Decimal,
}

impl ProgressiveBracket {
    pub fn new(
        upper_bound: Option<Decimal>,
        rate: Decimal,
        cumulative_deduction: Decimal,
    ) -> Self {
        Self {
            upper_bound,
            rate,
            cumulative_deduction,
        }
    }

    /// Applies this bracket's formula to `amount` without checking bounds.
    ///
    /// `None` if the result does not fit in a [`Decimal`].
    pub fn tax_for(
        &self,
        amount: Decimal,
    ) -> Option<Decimal> {
        amount
            .checked_mul(self.rate)?
            .checked_sub(self.cumulative_deduction)
    }

    pub fn contains(
        &self,
        amount: Decimal,
    ) -> bool {
        self.upper_bound.is_none_or(|upper| amount <= upper)
    }
}

/// The simplified four-bracket schedule. An approximation of the statutory
/// table, not the table itself.
pub fn default_brackets() -> Vec<ProgressiveBracket> {
    vec![
        ProgressiveBracket::new(Some(dec!(14000000)), dec!(0.06), dec!(0)),
        ProgressiveBracket::new(Some(dec!(50000000)), dec!(0.15), dec!(1260000)),
        ProgressiveBracket::new(Some(dec!(88000000)), dec!(0.24), dec!(5860000)),
        ProgressiveBracket::new(None, dec!(0.35), dec!(15440000)),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("no progressive brackets configured")]
    NoBrackets,

    #[error("the last progressive bracket must be unbounded")]
    UnboundedBracketMissing,

    #[error("bracket {position} is out of ascending order")]
    BracketsOutOfOrder { position: usize },

    #[error("negative rate {rate} in {field}")]
    NegativeRate { field: &'static str, rate: Decimal },

    #[error("negative threshold {0}")]
    NegativeThreshold(Decimal),
}

/// Difference between the next bracket's formula and this bracket's formula,
/// both evaluated at a shared bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketGap {
    pub bound: Decimal,
    pub gap: Decimal,
}

/// Rates, threshold and progressive schedule for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    pub tax_year: i32,
    pub flat_withholding_rate: Decimal,
    pub comprehensive_surcharge_rate: Decimal,
    pub threshold: Decimal,
    pub brackets: Vec<ProgressiveBracket>,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self::default_for_year(DEFAULT_TAX_YEAR)
    }
}

impl TaxPolicy {
    pub fn default_for_year(tax_year: i32) -> Self {
        Self {
            tax_year,
            flat_withholding_rate: FLAT_WITHHOLDING_RATE,
            comprehensive_surcharge_rate: COMPREHENSIVE_SURCHARGE_RATE,
            threshold: THRESHOLD,
            brackets: default_brackets(),
        }
    }

    /// Checks that the schedule can be searched: non-empty, strictly
    /// ascending, open-ended at the top, and free of negative rates.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.threshold < Decimal::ZERO {
            return Err(PolicyError::NegativeThreshold(self.threshold));
        }
        for (field, rate) in [
            ("flat_withholding_rate", self.flat_withholding_rate),
            ("comprehensive_surcharge_rate", self.comprehensive_surcharge_rate),
        ] {
            if rate < Decimal::ZERO {
                return Err(PolicyError::NegativeRate { field, rate });
            }
        }

        let Some(last) = self.brackets.last() else {
            return Err(PolicyError::NoBrackets);
        };
        if last.upper_bound.is_some() {
            return Err(PolicyError::UnboundedBracketMissing);
        }

        let mut previous: Option<Decimal> = None;
        for (position, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO {
                return Err(PolicyError::NegativeRate {
                    field: "bracket rate",
                    rate: bracket.rate,
                });
            }
            if position + 1 == self.brackets.len() {
                break;
            }
            let Some(upper) = bracket.upper_bound else {
                return Err(PolicyError::BracketsOutOfOrder { position });
            };
            if previous.is_some_and(|p| upper <= p) {
                return Err(PolicyError::BracketsOutOfOrder { position });
            }
            previous = Some(upper);
        }

        Ok(())
    }

    /// Every bound where the schedule jumps instead of joining up.
    ///
    /// A negative gap means tax falls when income crosses the bound, which
    /// breaks monotonicity of the estimate around that point.
    ///
    /// `None` if a gap at some bound is too large to represent.
    pub fn bracket_gaps(&self) -> Option<Vec<BracketGap>> {
        let mut gaps = Vec::new();
        for pair in self.brackets.windows(2) {
            let Some(bound) = pair[0].upper_bound else {
                continue;
            };
            let gap = pair[1]
                .tax_for(bound)?
                .checked_sub(pair[0].tax_for(bound)?)?;
            if !gap.is_zero() {
                gaps.push(BracketGap { bound, gap });
            }
        }
        Some(gaps)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_policy_uses_named_constants() {
        let policy = TaxPolicy::default();

        assert_eq!(policy.tax_year, DEFAULT_TAX_YEAR);
        assert_eq!(policy.flat_withholding_rate, dec!(0.154));
        assert_eq!(policy.comprehensive_surcharge_rate, dec!(1.1));
        assert_eq!(policy.threshold, dec!(20000000));
        assert_eq!(policy.brackets.len(), 4);
    }

    #[test]
    fn default_policy_is_valid() {
        assert_eq!(TaxPolicy::default().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_empty_schedule() {
        let policy = TaxPolicy {
            brackets: vec![],
            ..TaxPolicy::default()
        };

        assert_eq!(policy.validate(), Err(PolicyError::NoBrackets));
    }

    #[test]
    fn validate_rejects_bounded_top_bracket() {
        let mut policy = TaxPolicy::default();
        policy.brackets.pop();

        assert_eq!(policy.validate(), Err(PolicyError::UnboundedBracketMissing));
    }

    #[test]
    fn validate_rejects_descending_bounds() {
        let mut policy = TaxPolicy::default();
        policy.brackets.swap(0, 1);

        assert_eq!(
            policy.validate(),
            Err(PolicyError::BracketsOutOfOrder { position: 1 })
        );
    }

    #[test]
    fn validate_rejects_unbounded_bracket_before_the_end() {
        let mut policy = TaxPolicy::default();
        policy.brackets[1].upper_bound = None;

        assert_eq!(
            policy.validate(),
            Err(PolicyError::BracketsOutOfOrder { position: 1 })
        );
    }

    #[test]
    fn validate_rejects_negative_rates() {
        let policy = TaxPolicy {
            flat_withholding_rate: dec!(-0.1),
            ..TaxPolicy::default()
        };

        assert_eq!(
            policy.validate(),
            Err(PolicyError::NegativeRate {
                field: "flat_withholding_rate",
                rate: dec!(-0.1),
            })
        );
    }

    #[test]
    fn validate_rejects_negative_threshold() {
        let policy = TaxPolicy {
            threshold: dec!(-1),
            ..TaxPolicy::default()
        };

        assert_eq!(policy.validate(), Err(PolicyError::NegativeThreshold(dec!(-1))));
    }

    #[test]
    fn bracket_contains_is_inclusive_of_upper_bound() {
        let bracket = ProgressiveBracket::new(Some(dec!(14000000)), dec!(0.06), dec!(0));

        assert!(bracket.contains(dec!(14000000)));
        assert!(!bracket.contains(dec!(14000001)));
        assert!(bracket.contains(dec!(-5)));
    }

    #[test]
    fn default_schedule_joins_at_fourteen_million() {
        let gaps = TaxPolicy::default().bracket_gaps().unwrap();

        assert!(gaps.iter().all(|g| g.bound != dec!(14000000)));
    }

    #[test]
    fn default_schedule_reports_gaps_at_upper_bounds() {
        // 0.24 * 50M - 5.86M = 6.14M against 0.15 * 50M - 1.26M = 6.24M,
        // and 0.35 * 88M - 15.44M = 15.36M against 0.24 * 88M - 5.86M = 15.26M.
        let gaps = TaxPolicy::default().bracket_gaps();

        assert_eq!(
            gaps,
            Some(vec![
                BracketGap {
                    bound: dec!(50000000),
                    gap: dec!(-100000),
                },
                BracketGap {
                    bound: dec!(88000000),
                    gap: dec!(100000),
                },
            ])
        );
    }

    #[test]
    fn continuous_schedule_has_no_gaps() {
        let mut policy = TaxPolicy::default();
        policy.brackets[2].cumulative_deduction = dec!(5760000);
        policy.brackets[3].cumulative_deduction = dec!(15440000);

        assert_eq!(policy.bracket_gaps(), Some(vec![]));
    }

    #[test]
    fn tax_for_reports_overflow() {
        let bracket = ProgressiveBracket::new(None, dec!(2), dec!(0));

        assert_eq!(bracket.tax_for(dec!(50000000)), Some(dec!(100000000)));
        assert_eq!(bracket.tax_for(dec!(50000000000000000000000000000)), None);
    }

    #[test]
    fn gaps_at_unrepresentable_bounds_are_none() {
        let mut policy = TaxPolicy::default();
        policy.brackets = vec![
            ProgressiveBracket::new(Some(dec!(50000000000000000000000000000)), dec!(2), dec!(0)),
            ProgressiveBracket::new(None, dec!(2), dec!(0)),
        ];

        assert_eq!(policy.validate(), Ok(()));
        assert_eq!(policy.bracket_gaps(), None);
    }
}
