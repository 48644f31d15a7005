pub mod engine;
pub mod ranking;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::time_value::IrrOutcome;
use crate::types::{CoverageRatio, Money, PeriodCashflow, Percent, PropertyFinancials, Rating};

pub use engine::{analyze_scenarios, ScenarioEngine};
pub use ranking::{get_best_scenario, RankingMode};

// ---------------------------------------------------------------------------
// Assumptions
// ---------------------------------------------------------------------------

fn full_occupancy() -> Percent {
    Decimal::ONE_HUNDRED
}

/// Unfurnished lease to a single tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongTermAssumptions {
    pub monthly_rent: Money,
    #[serde(default = "full_occupancy")]
    pub occupancy_percent: Percent,
    /// Explicit annual opex; a policy share of gross income when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_opex: Option<Money>,
}

/// Nightly letting (holiday rental).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortStayAssumptions {
    pub average_daily_rate: Money,
    pub occupancy_percent: Percent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_opex: Option<Money>,
    /// Cleaning, linen and management on top of base opex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_operating_costs: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleAssumptions {
    pub sale_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_costs_percent: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_gains_rate_percent: Option<Percent>,
    /// Loan still owed at sale; derived from the amortization plan when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outstanding_loan_balance: Option<Money>,
    #[serde(default)]
    pub years_since_purchase: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioData {
    pub long_term: LongTermAssumptions,
    pub short_stay: ShortStayAssumptions,
    pub sale: SaleAssumptions,
    /// Enables the multi-year long-term projection and its IRR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holding_years: Option<u32>,
    #[serde(default)]
    pub rent_indexation_percent: Percent,
    #[serde(default)]
    pub ranking: RankingMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub property: PropertyFinancials,
    pub scenarios: ScenarioData,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// First-year figures of a rental strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalScenario {
    pub gross_annual_income: Money,
    pub base_operating_expenses: Money,
    /// Always zero for the long-term lease
    pub extra_operating_costs: Money,
    pub operating_expenses: Money,
    pub annual_debt_service: Money,
    pub net_operating_income: Money,
    pub net_cashflow: Money,
    pub cash_on_cash_percent: Percent,
    pub debt_service_coverage: CoverageRatio,
    pub break_even_occupancy_percent: Percent,
    pub rating: Rating,
}

/// Immediate sale. The annual block is zero apart from the debt service
/// the property carries until it is sold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleScenario {
    pub gross_annual_income: Money,
    pub operating_expenses: Money,
    pub net_operating_income: Money,
    pub annual_debt_service: Money,
    pub net_cashflow: Money,
    pub cash_on_cash_percent: Percent,
    pub sale_price: Money,
    pub selling_costs: Money,
    pub capital_gain: Money,
    pub capital_gains_tax: Money,
    pub outstanding_loan_balance: Money,
    pub net_sale_proceeds: Money,
    pub return_on_equity_percent: Percent,
    pub years_since_purchase: u32,
    pub rating: Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    LongTermRental,
    ShortStay,
    Sale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioResult {
    LongTermRental(RentalScenario),
    ShortStay(RentalScenario),
    Sale(SaleScenario),
}

impl ScenarioResult {
    pub fn kind(&self) -> ScenarioKind {
        match self {
            ScenarioResult::LongTermRental(_) => ScenarioKind::LongTermRental,
            ScenarioResult::ShortStay(_) => ScenarioKind::ShortStay,
            ScenarioResult::Sale(_) => ScenarioKind::Sale,
        }
    }

    pub fn rating(&self) -> &Rating {
        match self {
            ScenarioResult::LongTermRental(r) | ScenarioResult::ShortStay(r) => &r.rating,
            ScenarioResult::Sale(s) => &s.rating,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub total_investment: Money,
    pub loan_amount: Money,
    pub own_capital: Money,
    pub monthly_payment: Money,
    /// Long-term, short-stay and sale, in that order
    pub scenarios: Vec<ScenarioResult>,
    pub best_scenario: Option<ScenarioKind>,
    pub ranking: RankingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_term_projection: Option<Vec<PeriodCashflow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_term_irr: Option<IrrOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payback_year: Option<u32>,
}
