use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::{JurisdictionTaxPolicy, PolicyConfig};
use crate::error::PropCalcError;
use crate::tax::income::{
    assessed_value_or_estimate, recurring_property_tax, rental_income_tax, RentalIncomeTax,
};
use crate::tax::transfer::{transfer_tax, TransferTaxResult};
use crate::tax::{Jurisdiction, PropertyUse, RentalRegime};
use crate::types::{round_half_up, with_metadata, ComputationOutput, Money, Percent};
use crate::PropCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxEstimateInput {
    pub jurisdiction: Jurisdiction,
    /// Purchase price / market value
    pub price: Money,
    pub property_use: PropertyUse,
    /// Official assessed value (VPT / WOZ); estimated from `price` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_value: Option<Money>,
    /// Municipal recurring rate; policy default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_rate_percent: Option<Percent>,
    #[serde(default)]
    pub gross_annual_rent: Money,
    #[serde(default)]
    pub contract_years: u32,
    #[serde(default)]
    pub regime: RentalRegime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxEstimate {
    pub jurisdiction: Jurisdiction,
    pub transfer: TransferTaxResult,
    /// Transfer tax plus stamp duty
    pub one_time_transfer_tax: Money,
    pub assessed_value: Money,
    pub annual_recurring_tax: Money,
    pub rental: RentalIncomeTax,
    pub annual_income_tax: Money,
    /// Annual taxes (recurring + income) over gross rent
    pub effective_rate_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxComparisonInput {
    /// Jurisdictions to compare, in display order
    pub jurisdictions: Vec<Jurisdiction>,
    pub price: Money,
    pub property_use: PropertyUse,
    #[serde(default)]
    pub gross_annual_rent: Money,
    #[serde(default)]
    pub contract_years: u32,
    #[serde(default)]
    pub regime: RentalRegime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JurisdictionTaxRow {
    pub jurisdiction: Jurisdiction,
    pub estimate: TaxEstimate,
    /// One-time + recurring + income tax of the first holding year
    pub first_year_total: Money,
}

/// Per-category arithmetic difference `to - from`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxDifference {
    pub from: Jurisdiction,
    pub to: Jurisdiction,
    pub one_time_transfer_tax: Money,
    pub annual_recurring_tax: Money,
    pub annual_income_tax: Money,
    pub first_year_total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxComparison {
    pub rows: Vec<JurisdictionTaxRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<TaxDifference>,
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Jurisdiction-bound tax calculator.
pub struct TaxEstimator<'a> {
    jurisdiction: Jurisdiction,
    policy: &'a JurisdictionTaxPolicy,
}

impl<'a> TaxEstimator<'a> {
    pub fn new(jurisdiction: Jurisdiction, policy: &'a PolicyConfig) -> Self {
        Self {
            jurisdiction,
            policy: policy.tax.for_jurisdiction(jurisdiction),
        }
    }

    pub fn jurisdiction(&self) -> Jurisdiction {
        self.jurisdiction
    }

    pub fn transfer_tax(&self, price: Money, property_use: PropertyUse) -> TransferTaxResult {
        transfer_tax(self.policy, price, property_use)
    }

    /// Recurring tax on an assessed value, estimating the value from the
    /// market price and taking the policy rate when either is absent.
    pub fn recurring_property_tax(
        &self,
        assessed_value: Option<Money>,
        market_price: Money,
        rate_percent: Option<Percent>,
    ) -> (Money, Money) {
        let assessed = assessed_value_or_estimate(self.policy, assessed_value, market_price);
        let rate = rate_percent.unwrap_or(self.policy.default_recurring_rate_percent);
        (assessed, recurring_property_tax(assessed, rate))
    }

    pub fn rental_income_tax(
        &self,
        gross_annual_rent: Money,
        contract_years: u32,
        regime: RentalRegime,
    ) -> RentalIncomeTax {
        rental_income_tax(&self.policy.rental, gross_annual_rent, contract_years, regime)
    }

    /// Every tax category for one property. The input's jurisdiction is
    /// ignored in favour of the estimator's own.
    pub fn estimate(&self, input: &TaxEstimateInput) -> TaxEstimate {
        debug!(jurisdiction = ?self.jurisdiction, price = %input.price, "estimating taxes");

        let transfer = self.transfer_tax(input.price, input.property_use);
        let (assessed_value, annual_recurring_tax) = self.recurring_property_tax(
            input.assessed_value,
            input.price,
            input.recurring_rate_percent,
        );
        let rental =
            self.rental_income_tax(input.gross_annual_rent, input.contract_years, input.regime);

        let annual_income_tax = rental.tax_amount;
        let effective_rate_percent = if input.gross_annual_rent.is_zero() {
            Decimal::ZERO
        } else {
            round_half_up(
                (annual_recurring_tax + annual_income_tax) / input.gross_annual_rent * dec!(100),
                2,
            )
        };

        TaxEstimate {
            jurisdiction: self.jurisdiction,
            one_time_transfer_tax: transfer.total(),
            transfer,
            assessed_value,
            annual_recurring_tax,
            rental,
            annual_income_tax,
            effective_rate_percent,
        }
    }
}

/// Tax estimate for the input's jurisdiction, wrapped with metadata.
pub fn estimate_taxes(
    input: &TaxEstimateInput,
    policy: &PolicyConfig,
) -> ComputationOutput<TaxEstimate> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let estimate = TaxEstimator::new(input.jurisdiction, policy).estimate(input);

    if input.assessed_value.is_none() {
        warnings.push(format!(
            "No assessed value supplied; estimated at {}% of price",
            policy
                .tax
                .for_jurisdiction(input.jurisdiction)
                .assessed_value_ratio_percent
        ));
    }
    if input.regime == RentalRegime::ShortStay && input.contract_years > 0 {
        warnings.push("Contract duration is ignored for short-stay income".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Simplified transfer, recurring and rental income tax",
        input,
        warnings,
        elapsed,
        estimate,
    )
}

/// Side-by-side taxes of one property in several jurisdictions.
///
/// Each category is computed independently per jurisdiction; the difference
/// block compares the first two. No recommendation is made.
pub fn compare_jurisdictions(
    input: &TaxComparisonInput,
    policy: &PolicyConfig,
) -> PropCalcResult<ComputationOutput<TaxComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.jurisdictions.is_empty() {
        return Err(PropCalcError::InsufficientData(
            "At least one jurisdiction is required for a tax comparison".into(),
        ));
    }
    if input.jurisdictions.len() > 2 {
        warnings.push("Difference is reported between the first two jurisdictions only".into());
    }

    let rows: Vec<JurisdictionTaxRow> = input
        .jurisdictions
        .iter()
        .map(|&jurisdiction| {
            let estimate = TaxEstimator::new(jurisdiction, policy).estimate(&TaxEstimateInput {
                jurisdiction,
                price: input.price,
                property_use: input.property_use,
                assessed_value: None,
                recurring_rate_percent: None,
                gross_annual_rent: input.gross_annual_rent,
                contract_years: input.contract_years,
                regime: input.regime,
            });
            let first_year_total = estimate.one_time_transfer_tax
                + estimate.annual_recurring_tax
                + estimate.annual_income_tax;
            JurisdictionTaxRow {
                jurisdiction,
                estimate,
                first_year_total,
            }
        })
        .collect();

    let difference = match rows.as_slice() {
        [a, b, ..] => Some(TaxDifference {
            from: a.jurisdiction,
            to: b.jurisdiction,
            one_time_transfer_tax: b.estimate.one_time_transfer_tax
                - a.estimate.one_time_transfer_tax,
            annual_recurring_tax: b.estimate.annual_recurring_tax
                - a.estimate.annual_recurring_tax,
            annual_income_tax: b.estimate.annual_income_tax - a.estimate.annual_income_tax,
            first_year_total: b.first_year_total - a.first_year_total,
        }),
        _ => None,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cross-jurisdiction tax comparison (arithmetic only)",
        input,
        warnings,
        elapsed,
        TaxComparison { rows, difference },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> TaxEstimateInput {
        TaxEstimateInput {
            jurisdiction: Jurisdiction::Portugal,
            price: dec!(200000),
            property_use: PropertyUse::SecondaryResidence,
            assessed_value: None,
            recurring_rate_percent: None,
            gross_annual_rent: dec!(12000),
            contract_years: 5,
            regime: RentalRegime::LongTermLease,
        }
    }

    #[test]
    fn test_portugal_estimate() {
        let policy = PolicyConfig::default();
        let estimate = TaxEstimator::new(Jurisdiction::Portugal, &policy).estimate(&sample_input());

        // IMT secondary: 1019.17 + 749.90 + 2533.70 + 693.98 = 4996.75, stamp 1600
        assert_eq!(estimate.transfer.amount, dec!(4996.75));
        assert_eq!(estimate.one_time_transfer_tax, dec!(6596.75));
        // 60% of 200k at 0.3%
        assert_eq!(estimate.assessed_value, dec!(120000));
        assert_eq!(estimate.annual_recurring_tax, dec!(360));
        // 5-year lease: 15%
        assert_eq!(estimate.annual_income_tax, dec!(1800));
        // (360 + 1800) / 12000 = 18%
        assert_eq!(estimate.effective_rate_percent, dec!(18));
    }

    #[test]
    fn test_effective_rate_zero_without_rent() {
        let policy = PolicyConfig::default();
        let mut input = sample_input();
        input.gross_annual_rent = Decimal::ZERO;
        let estimate = TaxEstimator::new(Jurisdiction::Portugal, &policy).estimate(&input);
        assert_eq!(estimate.effective_rate_percent, Decimal::ZERO);
        assert_eq!(estimate.annual_income_tax, Decimal::ZERO);
    }

    #[test]
    fn test_estimate_warns_on_estimated_assessment() {
        let result = estimate_taxes(&sample_input(), &PolicyConfig::default());
        assert!(result.warnings.iter().any(|w| w.contains("assessed value")));
    }

    #[test]
    fn test_compare_requires_jurisdiction() {
        let input = TaxComparisonInput {
            jurisdictions: vec![],
            price: dec!(200000),
            property_use: PropertyUse::SecondaryResidence,
            gross_annual_rent: dec!(12000),
            contract_years: 1,
            regime: RentalRegime::LongTermLease,
        };
        assert!(compare_jurisdictions(&input, &PolicyConfig::default()).is_err());
    }
}
