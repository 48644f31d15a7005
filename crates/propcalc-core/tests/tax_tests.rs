use pretty_assertions::assert_eq;
use propcalc_core::config::PolicyConfig;
use propcalc_core::tax::estimator::{estimate_taxes, TaxComparisonInput, TaxEstimateInput};
use propcalc_core::tax::{compare_jurisdictions, Jurisdiction, PropertyUse, RentalRegime, TaxEstimator};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn comparison() -> TaxComparisonInput {
    TaxComparisonInput {
        jurisdictions: vec![Jurisdiction::Portugal, Jurisdiction::Netherlands],
        price: dec!(400000),
        property_use: PropertyUse::SecondaryResidence,
        gross_annual_rent: dec!(20000),
        contract_years: 10,
        regime: RentalRegime::LongTermLease,
    }
}

// ===========================================================================
// Cross-jurisdiction comparison
// ===========================================================================

#[test]
fn test_comparison_differences_add_up() {
    let out = compare_jurisdictions(&comparison(), &PolicyConfig::default())
        .unwrap()
        .result;
    assert_eq!(out.rows.len(), 2);

    for row in &out.rows {
        assert_eq!(
            row.first_year_total,
            row.estimate.one_time_transfer_tax
                + row.estimate.annual_recurring_tax
                + row.estimate.annual_income_tax
        );
    }

    let diff = out.difference.unwrap();
    assert_eq!(diff.from, Jurisdiction::Portugal);
    assert_eq!(diff.to, Jurisdiction::Netherlands);
    assert_eq!(
        diff.first_year_total,
        diff.one_time_transfer_tax + diff.annual_recurring_tax + diff.annual_income_tax
    );
    assert_eq!(
        diff.first_year_total,
        out.rows[1].first_year_total - out.rows[0].first_year_total
    );
}

#[test]
fn test_single_jurisdiction_has_no_difference() {
    let mut input = comparison();
    input.jurisdictions = vec![Jurisdiction::Netherlands];
    let out = compare_jurisdictions(&input, &PolicyConfig::default())
        .unwrap()
        .result;
    assert!(out.difference.is_none());
    // 10.4% overdrachtsbelasting on a secondary home
    assert_eq!(out.rows[0].estimate.one_time_transfer_tax, dec!(41600));
}

// ===========================================================================
// Single estimate
// ===========================================================================

#[test]
fn test_longer_lease_lowers_portuguese_rate() {
    let policy = PolicyConfig::default();
    let estimator = TaxEstimator::new(Jurisdiction::Portugal, &policy);
    let short = estimator.rental_income_tax(dec!(12000), 1, RentalRegime::LongTermLease);
    let long = estimator.rental_income_tax(dec!(12000), 20, RentalRegime::LongTermLease);
    assert_eq!(short.rate_percent, dec!(25));
    assert_eq!(long.rate_percent, dec!(5));
    assert!(long.net_amount > short.net_amount);
}

#[test]
fn test_zero_rent_zeroes_income_outputs() {
    let out = estimate_taxes(
        &TaxEstimateInput {
            jurisdiction: Jurisdiction::Netherlands,
            price: dec!(350000),
            property_use: PropertyUse::PrimaryResidence,
            assessed_value: Some(dec!(320000)),
            recurring_rate_percent: None,
            gross_annual_rent: Decimal::ZERO,
            contract_years: 0,
            regime: RentalRegime::LongTermLease,
        },
        &PolicyConfig::default(),
    );
    let estimate = out.result;
    assert_eq!(estimate.rental.gross_amount, Decimal::ZERO);
    assert_eq!(estimate.rental.net_amount, Decimal::ZERO);
    assert_eq!(estimate.effective_rate_percent, Decimal::ZERO);
    // 2% on a primary home, OZB 0.1% of the WOZ value
    assert_eq!(estimate.one_time_transfer_tax, dec!(7000));
    assert_eq!(estimate.annual_recurring_tax, dec!(320));
    assert!(out.warnings.is_empty());
}
