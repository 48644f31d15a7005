use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use propcalc_core::PolicyConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Caller-supplied policy JSON, or the compiled-in defaults.
fn policy_from(policy_json: Option<String>) -> NapiResult<PolicyConfig> {
    match policy_json {
        Some(json) => PolicyConfig::from_json_str(&json).map_err(to_napi_error),
        None => Ok(PolicyConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PaymentOutput {
    monthly_payment: Decimal,
}

#[napi]
pub fn monthly_payment(input_json: String) -> NapiResult<String> {
    let terms: propcalc_core::types::FinancingTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = PaymentOutput {
        monthly_payment: propcalc_core::amortization::monthly_payment(
            terms.principal,
            terms.annual_rate_percent,
            terms.term_years,
        )
        .map_err(to_napi_error)?,
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct BalanceInput {
    #[serde(flatten)]
    terms: propcalc_core::types::FinancingTerms,
    years_elapsed: u32,
}

#[derive(Serialize)]
struct BalanceOutput {
    remaining_balance: Decimal,
}

#[napi]
pub fn remaining_balance(input_json: String) -> NapiResult<String> {
    let input: BalanceInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = BalanceOutput {
        remaining_balance: propcalc_core::amortization::remaining_balance(
            input.terms.principal,
            input.terms.annual_rate_percent,
            input.terms.term_years,
            input.years_elapsed,
        )
        .map_err(to_napi_error)?,
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let terms: propcalc_core::types::FinancingTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propcalc_core::amortization::amortization_schedule(&terms).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// IRR and return metrics
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct IrrInput {
    cash_flows: Vec<Decimal>,
    #[serde(default)]
    initial_guess: Option<Decimal>,
    /// Error on non-convergence instead of a best-effort outcome
    #[serde(default)]
    strict: bool,
}

#[napi]
pub fn solve_irr(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: IrrInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let solver = propcalc_core::config::SolverPolicy {
        initial_guess: input.initial_guess.unwrap_or(policy.solver.initial_guess),
        ..policy.solver
    };

    if input.strict {
        let output = propcalc_core::time_value::solve_irr_with(&input.cash_flows, &solver)
            .map_err(to_napi_error)?;
        serde_json::to_string(&output).map_err(to_napi_error)
    } else {
        let output = propcalc_core::time_value::irr_outcome(&input.cash_flows, &solver);
        serde_json::to_string(&output).map_err(to_napi_error)
    }
}

#[napi]
pub fn return_metrics(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: propcalc_core::metrics::ReturnMetricsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = propcalc_core::metrics::analyze_returns_with(&input, &policy);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios and partners
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_scenarios(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: propcalc_core::scenarios::ScenarioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = propcalc_core::scenarios::ScenarioEngine::new(&policy)
        .analyze(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn allocate_partners(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: propcalc_core::partners::PartnerAllocationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = propcalc_core::partners::PartnerAllocationEngine::new(&policy)
        .allocate(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tax
// ---------------------------------------------------------------------------

#[napi]
pub fn estimate_tax(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: propcalc_core::tax::estimator::TaxEstimateInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = propcalc_core::tax::estimator::estimate_taxes(&input, &policy);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_tax(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: propcalc_core::tax::estimator::TaxComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = propcalc_core::tax::compare_jurisdictions(&input, &policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
