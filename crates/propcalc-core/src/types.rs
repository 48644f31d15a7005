use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PropCalcError;
use crate::PropCalcResult;

/// All monetary values, in major currency units (euros, not cents).
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Percentages expressed as whole numbers (5 = 5%). Every user-facing input
/// and output of this crate is a `Percent`; `Rate` only appears inside solvers.
pub type Percent = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

// ---------------------------------------------------------------------------
// Financing and property records
// ---------------------------------------------------------------------------

/// Fixed-rate annuity mortgage terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancingTerms {
    /// Amount borrowed
    pub principal: Money,
    /// Nominal annual interest rate (3.5 = 3.5%)
    pub annual_rate_percent: Percent,
    /// Amortization term in whole years
    pub term_years: u32,
}

impl FinancingTerms {
    pub fn new(principal: Money, annual_rate_percent: Percent, term_years: u32) -> Self {
        Self {
            principal,
            annual_rate_percent,
            term_years,
        }
    }

    /// Total number of monthly payments.
    pub fn total_months(&self) -> u32 {
        self.term_years.saturating_mul(12)
    }
}

/// Acquisition costs and financing of a single property.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyFinancials {
    pub purchase_price: Money,
    #[serde(default)]
    pub renovation_cost: Money,
    #[serde(default)]
    pub transfer_tax: Money,
    #[serde(default)]
    pub notary_fees: Money,
    #[serde(default)]
    pub furnishing_cost: Money,
    /// Financed share of the purchase price, 0..=100
    #[serde(default)]
    pub loan_to_value_percent: Percent,
    /// Rate and term of the mortgage. A zero principal means "derive the loan
    /// amount from `loan_to_value_percent`".
    #[serde(default)]
    pub financing: FinancingTerms,
}

impl PropertyFinancials {
    /// Purchase price plus every one-off acquisition cost.
    pub fn total_investment(&self) -> Money {
        self.purchase_price
            + self.renovation_cost
            + self.transfer_tax
            + self.notary_fees
            + self.furnishing_cost
    }

    /// Loan principal: the explicit financing principal when set, otherwise
    /// the LTV share of the purchase price.
    pub fn loan_amount(&self) -> Money {
        if self.financing.principal > Decimal::ZERO {
            self.financing.principal
        } else {
            self.purchase_price * self.loan_to_value_percent / dec!(100)
        }
    }

    /// Equity the owner actually puts in (never negative).
    pub fn own_capital(&self) -> Money {
        (self.total_investment() - self.loan_amount()).max(Decimal::ZERO)
    }

    /// Financing terms with the resolved loan amount as principal.
    pub fn resolved_financing(&self) -> FinancingTerms {
        FinancingTerms {
            principal: self.loan_amount(),
            ..self.financing.clone()
        }
    }

    pub fn validate(&self) -> PropCalcResult<()> {
        if self.loan_to_value_percent < Decimal::ZERO || self.loan_to_value_percent > dec!(100) {
            return Err(PropCalcError::InvalidInput {
                field: "loan_to_value_percent".into(),
                reason: "Loan-to-value must be between 0 and 100".into(),
            });
        }
        Ok(())
    }
}

/// One year of an annual-period projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCashflow {
    /// 0 is the acquisition row, 1..=N are operating years
    pub year: u32,
    pub gross_rent: Money,
    pub operating_expenses: Money,
    pub debt_service: Money,
    /// gross_rent - operating_expenses - debt_service
    pub net_cashflow: Money,
    /// Running total, starting at -own_capital in year 0
    pub cumulative_cashflow: Money,
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Positive,
    Neutral,
    Caution,
    Negative,
}

/// Qualitative label attached to a metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub label: String,
    pub severity: Severity,
}

impl Rating {
    pub fn excellent() -> Self {
        Self {
            label: "excellent".into(),
            severity: Severity::Positive,
        }
    }

    pub fn good() -> Self {
        Self {
            label: "good".into(),
            severity: Severity::Neutral,
        }
    }

    pub fn fair() -> Self {
        Self {
            label: "fair".into(),
            severity: Severity::Caution,
        }
    }

    pub fn risk() -> Self {
        Self {
            label: "risk".into(),
            severity: Severity::Negative,
        }
    }
}

/// Debt service coverage. `Infinite` is the sentinel for "no debt to cover".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageRatio {
    Finite(Decimal),
    Infinite,
}

impl CoverageRatio {
    pub fn is_infinite(&self) -> bool {
        matches!(self, CoverageRatio::Infinite)
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            CoverageRatio::Finite(v) => Some(*v),
            CoverageRatio::Infinite => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Round half toward positive infinity: `floor(value * 10^dp + 0.5) / 10^dp`.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let scale = Decimal::from(10_i64.pow(dp));
    value
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(dec!(0.5)))
        .map(|shifted| shifted.floor() / scale)
        // No fractional digits left at this magnitude
        .unwrap_or_else(|| value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
}

/// Round a currency amount to cents.
pub fn round_money(value: Money) -> Money {
    round_half_up(value, 2)
}

// ---------------------------------------------------------------------------
// Output envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
