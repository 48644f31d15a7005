use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{PolicyConfig, RatingBands};
use crate::types::{
    round_half_up, with_metadata, ComputationOutput, CoverageRatio, Money, Percent, Rating,
};

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

/// Annual gross rent over purchase price, in percent. 0 for a zero price.
pub fn gross_initial_yield(annual_gross_rent: Money, purchase_price: Money) -> Percent {
    if purchase_price.is_zero() {
        return Decimal::ZERO;
    }
    annual_gross_rent / purchase_price * dec!(100)
}

/// NOI (before debt service) over total investment, in percent.
pub fn net_initial_yield(net_operating_income: Money, total_investment: Money) -> Percent {
    if total_investment.is_zero() {
        return Decimal::ZERO;
    }
    net_operating_income / total_investment * dec!(100)
}

/// NOI over annual debt service; `Infinite` when there is no debt.
pub fn debt_service_coverage_ratio(
    net_operating_income: Money,
    annual_debt_service: Money,
) -> CoverageRatio {
    if annual_debt_service.is_zero() {
        return CoverageRatio::Infinite;
    }
    CoverageRatio::Finite(net_operating_income / annual_debt_service)
}

/// Annual net cashflow over own capital, in percent.
///
/// A fully debt-financed purchase (own capital 0) yields 0, not infinity,
/// unlike [`debt_service_coverage_ratio`].
pub fn cash_on_cash(net_cashflow_annual: Money, own_capital: Money) -> Percent {
    if own_capital.is_zero() {
        return Decimal::ZERO;
    }
    net_cashflow_annual / own_capital * dec!(100)
}

/// Occupancy at which income covers opex plus debt service, in percent.
/// Values above 100 mean break-even is out of reach. 0 when no income is achievable.
pub fn break_even_occupancy_percent(
    annual_opex: Money,
    annual_debt_service: Money,
    max_achievable_gross_income: Money,
) -> Percent {
    if max_achievable_gross_income.is_zero() {
        return Decimal::ZERO;
    }
    (annual_opex + annual_debt_service) / max_achievable_gross_income * dec!(100)
}

/// DSCR rating. Without debt the sign of NOI decides: a loss is a risk
/// even with nothing to cover, otherwise excellent.
pub fn rate_coverage(
    coverage: CoverageRatio,
    net_operating_income: Money,
    bands: &RatingBands,
) -> Rating {
    match coverage {
        CoverageRatio::Infinite if net_operating_income < Decimal::ZERO => Rating::risk(),
        CoverageRatio::Infinite => Rating::excellent(),
        CoverageRatio::Finite(v) => bands.rate(v),
    }
}

// ---------------------------------------------------------------------------
// Period bundle
// ---------------------------------------------------------------------------

/// One operating year of a single property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnMetricsInput {
    pub purchase_price: Money,
    pub total_investment: Money,
    pub own_capital: Money,
    /// Rent actually collected this period
    pub annual_gross_rent: Money,
    /// Rent at 100% occupancy; defaults to `annual_gross_rent`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_achievable_gross_income: Option<Money>,
    pub annual_opex: Money,
    pub annual_debt_service: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnMetricsOutput {
    pub net_operating_income: Money,
    pub net_cashflow_annual: Money,
    pub gross_initial_yield_percent: Percent,
    pub net_initial_yield_percent: Percent,
    pub debt_service_coverage: CoverageRatio,
    pub cash_on_cash_percent: Percent,
    pub break_even_occupancy_percent: Percent,
    pub cash_on_cash_rating: Rating,
    pub debt_service_coverage_rating: Rating,
}

/// Every yield ratio and rating for one period, under the given policy.
pub fn analyze_returns_with(
    input: &ReturnMetricsInput,
    policy: &PolicyConfig,
) -> ComputationOutput<ReturnMetricsOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let noi = input.annual_gross_rent - input.annual_opex;
    let net_cashflow = noi - input.annual_debt_service;
    let max_income = input
        .max_achievable_gross_income
        .unwrap_or(input.annual_gross_rent);

    let dscr = debt_service_coverage_ratio(noi, input.annual_debt_service);
    let coc = cash_on_cash(net_cashflow, input.own_capital);
    let break_even =
        break_even_occupancy_percent(input.annual_opex, input.annual_debt_service, max_income);

    if let Some(v) = dscr.value() {
        if v < Decimal::ONE {
            warnings.push(format!(
                "DSCR of {:.2} is below 1.00x; rent does not cover the mortgage",
                v
            ));
        }
    }
    if break_even > dec!(100) {
        warnings.push(format!(
            "Break-even occupancy {:.1}% exceeds 100%; costs cannot be covered",
            break_even
        ));
    }
    if input.own_capital.is_zero() {
        warnings.push("Own capital is zero; cash-on-cash reported as 0".into());
    }

    let output = ReturnMetricsOutput {
        net_operating_income: noi,
        net_cashflow_annual: net_cashflow,
        gross_initial_yield_percent: round_half_up(
            gross_initial_yield(input.annual_gross_rent, input.purchase_price),
            2,
        ),
        net_initial_yield_percent: round_half_up(
            net_initial_yield(noi, input.total_investment),
            2,
        ),
        debt_service_coverage: match dscr {
            CoverageRatio::Finite(v) => CoverageRatio::Finite(round_half_up(v, 2)),
            CoverageRatio::Infinite => CoverageRatio::Infinite,
        },
        cash_on_cash_percent: round_half_up(coc, 2),
        break_even_occupancy_percent: round_half_up(break_even, 2),
        cash_on_cash_rating: policy.ratings.long_term_cash_on_cash.rate(coc),
        debt_service_coverage_rating: rate_coverage(
            dscr,
            noi,
            &policy.ratings.debt_service_coverage,
        ),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Single-period return metrics (yields, DSCR, cash-on-cash, break-even)",
        input,
        warnings,
        elapsed,
        output,
    )
}

/// [`analyze_returns_with`] under the default policy.
pub fn analyze_returns(input: &ReturnMetricsInput) -> ComputationOutput<ReturnMetricsOutput> {
    analyze_returns_with(input, &PolicyConfig::default())
}
