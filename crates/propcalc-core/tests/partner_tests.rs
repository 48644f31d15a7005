use pretty_assertions::assert_eq;
use propcalc_core::config::PolicyConfig;
use propcalc_core::partners::{
    allocate_partners, InvestmentPartner, PartnerAllocationEngine, PartnerAllocationInput,
};
use propcalc_core::types::FinancingTerms;
use propcalc_core::PropCalcError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn partner(name: &str, share: Decimal) -> InvestmentPartner {
    InvestmentPartner {
        name: name.into(),
        percentage_share: share,
        own_financing: None,
    }
}

fn input(partners: Vec<InvestmentPartner>) -> PartnerAllocationInput {
    PartnerAllocationInput {
        total_investment: dec!(300000),
        partners,
        annual_gross_rent: dec!(18000),
        annual_opex: dec!(3000),
        indexation_percent: dec!(2),
        sale_price: dec!(360000),
        exit_year: 10,
    }
}

// ===========================================================================
// Percentage-sum invariant
// ===========================================================================

#[test]
fn test_sixty_forty_allocates() {
    let out = allocate_partners(&input(vec![partner("Ana", dec!(60)), partner("Bram", dec!(40))]))
        .unwrap()
        .result;
    assert_eq!(out.partners.len(), 2);
    assert_eq!(out.totals.own_equity, dec!(300000));
}

#[test]
fn test_sixty_thirty_is_invalid_allocation() {
    let err = allocate_partners(&input(vec![partner("Ana", dec!(60)), partner("Bram", dec!(30))]))
        .unwrap_err();
    assert!(matches!(err, PropCalcError::InvalidAllocation { total } if total == dec!(90)));
}

#[test]
fn test_tolerance_comes_from_policy() {
    let mut policy = PolicyConfig::default();
    policy.partners.allocation_tolerance = dec!(0.5);
    let shares = vec![partner("Ana", dec!(60)), partner("Bram", dec!(39.6))];
    assert!(allocate_partners(&input(shares.clone())).is_err());
    assert!(PartnerAllocationEngine::new(&policy).allocate(&input(shares)).is_ok());
}

// ===========================================================================
// Per-partner figures
// ===========================================================================

#[test]
fn test_indexed_rent_and_exit_folded_into_last_year() {
    let out = allocate_partners(&input(vec![partner("Ana", dec!(50)), partner("Bram", dec!(50))]))
        .unwrap()
        .result;
    let ana = &out.partners[0];
    // Year 1: 9000 - 1500
    assert_eq!(ana.cashflows[1], dec!(7500));
    assert_eq!(ana.annual_rent, dec!(7500));
    // Year 2: 9000 * 1.02 - 1500
    assert_eq!(ana.cashflows[2], dec!(7680));
    assert_eq!(ana.exit_value, dec!(180000));
    assert!(ana.cashflows[10] > ana.exit_value);
    assert!(ana.irr_converged);
    assert!(ana.irr_percent > dec!(0));
}

#[test]
fn test_partner_debt_stops_after_term() {
    let mut bram = partner("Bram", dec!(50));
    bram.own_financing = Some(FinancingTerms::new(dec!(60000), dec!(0), 5));
    let out = allocate_partners(&input(vec![partner("Ana", dec!(50)), bram]))
        .unwrap()
        .result;
    let bram = &out.partners[1];
    assert_eq!(bram.own_equity, dec!(90000));
    // Years 1..=5 carry 12000 of debt service, year 6 none
    // 1.02^4 = 1.08243216
    let year5_rent = dec!(9000) * dec!(1.08243216) - dec!(1500) - dec!(12000);
    assert!((bram.cashflows[5] - year5_rent).abs() < dec!(0.01));
    assert!(bram.cashflows[6] > dec!(7500));
    // Loan repaid before exit
    assert_eq!(bram.exit_value, dec!(180000));
}
