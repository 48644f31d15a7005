use propcalc_core::config::PolicyConfig;
use propcalc_core::metrics::{
    analyze_returns, analyze_returns_with, cash_on_cash, debt_service_coverage_ratio,
    ReturnMetricsInput,
};
use propcalc_core::projection::{indexed_amount, project_cashflows, ProjectionInput};
use propcalc_core::time_value::{irr_outcome, irr_percent, solve_irr, DEFAULT_IRR_GUESS};
use propcalc_core::types::{CoverageRatio, FinancingTerms};
use propcalc_core::PropCalcError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fully_financed() -> ReturnMetricsInput {
    ReturnMetricsInput {
        purchase_price: dec!(180000),
        total_investment: dec!(180000),
        own_capital: dec!(0),
        annual_gross_rent: dec!(13200),
        max_achievable_gross_income: None,
        annual_opex: dec!(2200),
        annual_debt_service: dec!(9000),
    }
}

// ===========================================================================
// Degenerate ratios: DSCR infinity vs cash-on-cash zero
// ===========================================================================

#[test]
fn test_dscr_without_debt_is_infinite() {
    assert_eq!(
        debt_service_coverage_ratio(dec!(1000), dec!(0)),
        CoverageRatio::Infinite
    );
    assert!(debt_service_coverage_ratio(dec!(1000), dec!(0)).is_infinite());
}

#[test]
fn test_cash_on_cash_without_equity_is_zero() {
    assert_eq!(cash_on_cash(dec!(2000), dec!(0)), Decimal::ZERO);

    let out = analyze_returns(&fully_financed());
    assert_eq!(out.result.cash_on_cash_percent, Decimal::ZERO);
    // The same deal has a finite, positive DSCR: the two fallbacks differ
    assert_eq!(
        out.result.debt_service_coverage,
        CoverageRatio::Finite(dec!(1.22))
    );
    assert!(out.warnings.iter().any(|w| w.contains("Own capital")));
}

#[test]
fn test_policy_override_changes_rating() {
    let mut input = fully_financed();
    input.own_capital = dec!(40000);
    // 2000 / 40000 = 5%: "fair" under the default 10/6/3 bands
    let default = analyze_returns(&input).result;
    assert_eq!(default.cash_on_cash_rating.label, "fair");

    let policy = PolicyConfig::from_json_str(
        r#"{"ratings": {"long_term_cash_on_cash": {"excellent": "5", "good": "3", "fair": "1"}}}"#,
    )
    .unwrap();
    let tuned = analyze_returns_with(&input, &policy).result;
    assert_eq!(tuned.cash_on_cash_rating.label, "excellent");
}

// ===========================================================================
// IRR solver
// ===========================================================================

#[test]
fn test_irr_trivial_cashflow() {
    let solution = solve_irr(&[dec!(-100), dec!(110)], DEFAULT_IRR_GUESS).unwrap();
    assert!((solution.rate_percent - dec!(10.0)).abs() <= dec!(0.1));
    assert_eq!(irr_percent(&[dec!(-100), dec!(110)], DEFAULT_IRR_GUESS), dec!(10.0));
}

#[test]
fn test_irr_no_sign_change_is_reported() {
    let flows = [dec!(-100), dec!(-50), dec!(-50)];
    match solve_irr(&flows, DEFAULT_IRR_GUESS) {
        Err(PropCalcError::ConvergenceFailure { iterations, .. }) => assert!(iterations > 0),
        other => panic!("expected ConvergenceFailure, got {other:?}"),
    }
    let outcome = irr_outcome(&flows, &PolicyConfig::default().solver);
    assert!(!outcome.converged);
}

// ===========================================================================
// Indexed rent
// ===========================================================================

#[test]
fn test_indexed_rent_compounds_from_year_two() {
    let base = dec!(12000);
    assert_eq!(indexed_amount(base, dec!(2), 1).unwrap(), base);
    assert_eq!(indexed_amount(base, dec!(2), 3).unwrap(), base * dec!(1.02) * dec!(1.02));

    let rows = project_cashflows(&ProjectionInput {
        annual_gross_rent: base,
        annual_opex: dec!(0),
        rent_indexation_percent: dec!(2),
        opex_indexation_percent: dec!(0),
        own_capital: dec!(50000),
        financing: FinancingTerms::default(),
        years: 3,
    })
    .unwrap();
    assert_eq!(rows[1].gross_rent, dec!(12000));
    assert_eq!(rows[3].gross_rent, dec!(12484.80));
}

#[test]
fn test_runaway_indexation_is_invalid_input() {
    let err = indexed_amount(dec!(12000), dec!(100), 90).unwrap_err();
    assert!(matches!(err, PropCalcError::InvalidInput { .. }));

    let result = project_cashflows(&ProjectionInput {
        annual_gross_rent: dec!(12000),
        annual_opex: dec!(0),
        rent_indexation_percent: dec!(100),
        opex_indexation_percent: dec!(0),
        own_capital: dec!(50000),
        financing: FinancingTerms::default(),
        years: 90,
    });
    assert!(result.is_err());
}
