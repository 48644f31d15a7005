use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PropCalcError;
use crate::types::{Money, Percent, Rating};
use crate::PropCalcResult;

// ---------------------------------------------------------------------------
// Policy root
// ---------------------------------------------------------------------------

/// Every tunable policy constant of the calculation core.
///
/// `Default` is the compiled-in policy. Partial JSON/YAML documents are
/// accepted: any missing section or field keeps its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub ratings: RatingPolicy,
    pub scenarios: ScenarioPolicy,
    pub partners: PartnerPolicy,
    pub solver: SolverPolicy,
    pub tax: TaxPolicy,
}

impl PolicyConfig {
    /// Parse a (possibly partial) JSON policy document and validate it.
    pub fn from_json_str(json: &str) -> PropCalcResult<Self> {
        let policy: Self =
            serde_json::from_str(json).map_err(|e| PropCalcError::Config(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> PropCalcResult<()> {
        self.ratings.long_term_cash_on_cash.validate("ratings.long_term_cash_on_cash")?;
        self.ratings.short_stay_cash_on_cash.validate("ratings.short_stay_cash_on_cash")?;
        self.ratings.sale_return_on_equity.validate("ratings.sale_return_on_equity")?;
        self.ratings.debt_service_coverage.validate("ratings.debt_service_coverage")?;

        if self.partners.allocation_tolerance < Decimal::ZERO {
            return Err(PropCalcError::Config(
                "partners.allocation_tolerance must not be negative".into(),
            ));
        }
        if self.solver.max_iterations == 0 {
            return Err(PropCalcError::Config(
                "solver.max_iterations must be at least 1".into(),
            ));
        }
        if self.solver.tolerance <= Decimal::ZERO {
            return Err(PropCalcError::Config(
                "solver.tolerance must be positive".into(),
            ));
        }

        self.tax.portugal.validate("tax.portugal")?;
        self.tax.netherlands.validate("tax.netherlands")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

/// Lower bounds for the "excellent", "good" and "fair" labels. Anything
/// below `fair` is rated "risk".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingBands {
    pub excellent: Decimal,
    pub good: Decimal,
    pub fair: Decimal,
}

impl RatingBands {
    pub fn new(excellent: Decimal, good: Decimal, fair: Decimal) -> Self {
        Self {
            excellent,
            good,
            fair,
        }
    }

    pub fn rate(&self, value: Decimal) -> Rating {
        if value >= self.excellent {
            Rating::excellent()
        } else if value >= self.good {
            Rating::good()
        } else if value >= self.fair {
            Rating::fair()
        } else {
            Rating::risk()
        }
    }

    fn validate(&self, name: &str) -> PropCalcResult<()> {
        if self.excellent < self.good || self.good < self.fair {
            return Err(PropCalcError::Config(format!(
                "{name}: bands must satisfy excellent >= good >= fair"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingPolicy {
    /// Cash-on-cash % bands for the long-term rental strategy
    pub long_term_cash_on_cash: RatingBands,
    /// Short-stay bands sit higher to reflect the extra effort and risk
    pub short_stay_cash_on_cash: RatingBands,
    /// Return-on-equity % bands for an immediate sale
    pub sale_return_on_equity: RatingBands,
    /// DSCR multiple bands
    pub debt_service_coverage: RatingBands,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            long_term_cash_on_cash: RatingBands::new(dec!(10), dec!(6), dec!(3)),
            short_stay_cash_on_cash: RatingBands::new(dec!(12), dec!(8), dec!(4)),
            sale_return_on_equity: RatingBands::new(dec!(50), dec!(25), dec!(0)),
            debt_service_coverage: RatingBands::new(dec!(1.5), dec!(1.25), dec!(1.0)),
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario, partner and solver policies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioPolicy {
    /// Opex estimate for long-term rentals when none is supplied (% of gross)
    pub default_long_term_opex_percent: Percent,
    /// Base opex estimate for short-stay when none is supplied (% of gross)
    pub default_short_stay_opex_percent: Percent,
    /// Cleaning/management cost estimate for short-stay (% of gross)
    pub short_stay_extra_cost_percent: Percent,
    /// Flat capital-gains rate applied to the positive sale gain
    pub capital_gains_rate_percent: Percent,
    /// Agency/selling costs when none are supplied (% of sale price)
    pub default_selling_costs_percent: Percent,
}

impl Default for ScenarioPolicy {
    fn default() -> Self {
        Self {
            default_long_term_opex_percent: dec!(20),
            default_short_stay_opex_percent: dec!(20),
            short_stay_extra_cost_percent: dec!(20),
            capital_gains_rate_percent: dec!(28),
            default_selling_costs_percent: dec!(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartnerPolicy {
    /// Allowed deviation of the summed shares from 100 (percentage points)
    pub allocation_tolerance: Percent,
}

impl Default for PartnerPolicy {
    fn default() -> Self {
        Self {
            allocation_tolerance: dec!(0.01),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverPolicy {
    /// Starting rate (decimal fraction)
    pub initial_guess: Decimal,
    pub max_iterations: u32,
    /// Stop once successive rates differ by less than this
    pub tolerance: Decimal,
    /// |IRR| above this percentage is flagged as unreliable
    pub unreliable_above_percent: Percent,
}

impl Default for SolverPolicy {
    fn default() -> Self {
        Self {
            initial_guess: dec!(0.10),
            max_iterations: 100,
            tolerance: dec!(0.0001),
            unreliable_above_percent: dec!(1000),
        }
    }
}

// ---------------------------------------------------------------------------
// Tax policy
// ---------------------------------------------------------------------------

/// One row of a transfer-tax table.
///
/// A marginal bracket taxes only the slice of the price that falls inside it.
/// A flat bracket taxes the whole price at its rate once the price lands in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferBracket {
    /// Inclusive upper bound; `None` for the open-ended top bracket
    pub up_to: Option<Money>,
    pub rate_percent: Percent,
    #[serde(default)]
    pub flat: bool,
}

impl TransferBracket {
    pub fn marginal(up_to: Money, rate_percent: Percent) -> Self {
        Self {
            up_to: Some(up_to),
            rate_percent,
            flat: false,
        }
    }

    pub fn flat(up_to: Option<Money>, rate_percent: Percent) -> Self {
        Self {
            up_to,
            rate_percent,
            flat: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTables {
    pub primary_residence: Vec<TransferBracket>,
    pub secondary_residence: Vec<TransferBracket>,
    pub non_residential: Vec<TransferBracket>,
}

/// Minimum lease duration for a reduced rental-income rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationBracket {
    pub min_years: u32,
    pub rate_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalTaxPolicy {
    /// Rate for leases shorter than every duration bracket
    pub base_rate_percent: Percent,
    /// Ascending by `min_years`; the longest bracket reached wins
    pub duration_brackets: Vec<DurationBracket>,
    /// Share of short-stay gross income that is taxable
    pub short_stay_taxable_percent: Percent,
    pub short_stay_rate_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionTaxPolicy {
    pub transfer: TransferTables,
    /// One-off stamp duty on the purchase price
    pub stamp_duty_percent: Percent,
    /// Assessed value used when no official valuation is supplied (% of market price)
    pub assessed_value_ratio_percent: Percent,
    /// Annual recurring property tax on the assessed value
    pub default_recurring_rate_percent: Percent,
    pub rental: RentalTaxPolicy,
}

impl JurisdictionTaxPolicy {
    /// Portuguese IMT 2024 (mainland), Imposto do Selo, IMI and category F
    /// autonomous rental taxation after the 2023 housing reform.
    pub fn portugal() -> Self {
        Self {
            transfer: TransferTables {
                primary_residence: vec![
                    TransferBracket::marginal(dec!(101917), dec!(0)),
                    TransferBracket::marginal(dec!(139412), dec!(2)),
                    TransferBracket::marginal(dec!(190086), dec!(5)),
                    TransferBracket::marginal(dec!(316772), dec!(7)),
                    TransferBracket::marginal(dec!(633453), dec!(8)),
                    TransferBracket::flat(Some(dec!(1102920)), dec!(6)),
                    TransferBracket::flat(None, dec!(7.5)),
                ],
                secondary_residence: vec![
                    TransferBracket::marginal(dec!(101917), dec!(1)),
                    TransferBracket::marginal(dec!(139412), dec!(2)),
                    TransferBracket::marginal(dec!(190086), dec!(5)),
                    TransferBracket::marginal(dec!(316772), dec!(7)),
                    TransferBracket::marginal(dec!(607528), dec!(8)),
                    TransferBracket::flat(Some(dec!(1102920)), dec!(6)),
                    TransferBracket::flat(None, dec!(7.5)),
                ],
                non_residential: vec![TransferBracket::flat(None, dec!(6.5))],
            },
            stamp_duty_percent: dec!(0.8),
            assessed_value_ratio_percent: dec!(60),
            default_recurring_rate_percent: dec!(0.3),
            rental: RentalTaxPolicy {
                base_rate_percent: dec!(25),
                duration_brackets: vec![
                    DurationBracket {
                        min_years: 5,
                        rate_percent: dec!(15),
                    },
                    DurationBracket {
                        min_years: 10,
                        rate_percent: dec!(10),
                    },
                    DurationBracket {
                        min_years: 20,
                        rate_percent: dec!(5),
                    },
                ],
                short_stay_taxable_percent: dec!(35),
                short_stay_rate_percent: dec!(28),
            },
        }
    }

    /// Dutch overdrachtsbelasting 2024, an OZB-style municipal rate, and a
    /// flat Box 3 approximation on gross rent (no duration relief).
    pub fn netherlands() -> Self {
        Self {
            transfer: TransferTables {
                primary_residence: vec![TransferBracket::flat(None, dec!(2))],
                secondary_residence: vec![TransferBracket::flat(None, dec!(10.4))],
                non_residential: vec![TransferBracket::flat(None, dec!(10.4))],
            },
            stamp_duty_percent: Decimal::ZERO,
            assessed_value_ratio_percent: dec!(60),
            default_recurring_rate_percent: dec!(0.1),
            rental: RentalTaxPolicy {
                base_rate_percent: dec!(36),
                duration_brackets: Vec::new(),
                short_stay_taxable_percent: dec!(100),
                short_stay_rate_percent: dec!(36),
            },
        }
    }

    fn validate(&self, name: &str) -> PropCalcResult<()> {
        for (use_class, table) in [
            ("primary_residence", &self.transfer.primary_residence),
            ("secondary_residence", &self.transfer.secondary_residence),
            ("non_residential", &self.transfer.non_residential),
        ] {
            validate_transfer_table(&format!("{name}.transfer.{use_class}"), table)?;
        }

        let ascending = self
            .rental
            .duration_brackets
            .windows(2)
            .all(|w| w[0].min_years < w[1].min_years);
        if !ascending {
            return Err(PropCalcError::Config(format!(
                "{name}.rental.duration_brackets must be strictly ascending by min_years"
            )));
        }
        Ok(())
    }
}

fn validate_transfer_table(name: &str, table: &[TransferBracket]) -> PropCalcResult<()> {
    let Some(last) = table.last() else {
        return Err(PropCalcError::Config(format!("{name} must not be empty")));
    };
    if last.up_to.is_some() {
        return Err(PropCalcError::Config(format!(
            "{name}: the last bracket must be open-ended (up_to = null)"
        )));
    }

    let mut previous = Decimal::ZERO;
    for bracket in &table[..table.len() - 1] {
        match bracket.up_to {
            Some(limit) if limit > previous => previous = limit,
            _ => {
                return Err(PropCalcError::Config(format!(
                    "{name}: bracket limits must be strictly ascending and only the last may be open-ended"
                )))
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxPolicy {
    pub portugal: JurisdictionTaxPolicy,
    pub netherlands: JurisdictionTaxPolicy,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            portugal: JurisdictionTaxPolicy::portugal(),
            netherlands: JurisdictionTaxPolicy::netherlands(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(PolicyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rating_bands_boundaries() {
        let bands = RatingBands::new(dec!(10), dec!(6), dec!(3));
        assert_eq!(bands.rate(dec!(10)).label, "excellent");
        assert_eq!(bands.rate(dec!(9.99)).label, "good");
        assert_eq!(bands.rate(dec!(6)).label, "good");
        assert_eq!(bands.rate(dec!(3)).label, "fair");
        assert_eq!(bands.rate(dec!(2.99)).label, "risk");
        assert_eq!(bands.rate(dec!(-5)).label, "risk");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "scenarios": { "capital_gains_rate_percent": "14" } }"#;
        let policy = PolicyConfig::from_json_str(json).unwrap();
        assert_eq!(policy.scenarios.capital_gains_rate_percent, dec!(14));
        assert_eq!(policy.scenarios.short_stay_extra_cost_percent, dec!(20));
        assert_eq!(policy.solver.max_iterations, 100);
        assert_eq!(policy.tax, TaxPolicy::default());
    }

    #[test]
    fn test_inverted_bands_rejected() {
        let json = r#"{ "ratings": { "long_term_cash_on_cash": { "excellent": "3", "good": "6", "fair": "10" } } }"#;
        let err = PolicyConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, PropCalcError::Config(_)));
    }

    #[test]
    fn test_closed_top_bracket_rejected() {
        let mut policy = PolicyConfig::default();
        policy.tax.netherlands.transfer.primary_residence =
            vec![TransferBracket::marginal(dec!(500000), dec!(2))];
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = PolicyConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PropCalcError::Config(_)));
    }
}
