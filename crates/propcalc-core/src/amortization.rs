use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PropCalcError;
use crate::types::{round_money, FinancingTerms, Money, Percent, Rate};
use crate::PropCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One monthly instalment of a fixed-rate annuity loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Balance after this payment
    pub balance: Money,
}

/// Twelve monthly rows rolled up into one loan year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub opening_balance: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub closing_balance: Money,
}

/// Full repayment plan of a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub months: Vec<AmortizationRow>,
    pub years: Vec<AmortizationYear>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fixed-rate monthly annuity payment, rounded to cents.
///
/// `P * r(1+r)^n / ((1+r)^n - 1)` with `r = annual_rate_percent / 100 / 12` and
/// `n = term_years * 12`. A zero principal or zero rate degenerates to the
/// straight-line `principal / n`, returned unrounded. A zero term has no
/// schedule and yields 0. Inputs whose compounding leaves the decimal range
/// are rejected as `InvalidInput`.
pub fn monthly_payment(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: u32,
) -> PropCalcResult<Money> {
    let n = total_months(term_years)?;
    if n == 0 {
        return Ok(Decimal::ZERO);
    }
    if principal.is_zero() || annual_rate_percent.is_zero() {
        return Ok(principal / Decimal::from(n));
    }
    let payment = exact_payment(principal, monthly_rate(annual_rate_percent), n)?;
    Ok(round_money(payment))
}

/// Twelve monthly payments, rounded to cents.
pub fn annual_debt_service(terms: &FinancingTerms) -> PropCalcResult<Money> {
    let payment = monthly_payment(terms.principal, terms.annual_rate_percent, terms.term_years)?;
    payment
        .checked_mul(dec!(12))
        .map(round_money)
        .ok_or_else(|| overflow("financing.principal"))
}

/// Outstanding balance after `years_elapsed` full years of payments.
pub fn remaining_balance(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: u32,
    years_elapsed: u32,
) -> PropCalcResult<Money> {
    remaining_balance_after_months(
        principal,
        annual_rate_percent,
        term_years,
        years_elapsed.saturating_mul(12),
    )
}

/// Outstanding balance after `months_elapsed` monthly payments.
///
/// Present value of the remaining payments at the loan rate, rounded to cents.
/// Zero once the term is over, never negative.
pub fn remaining_balance_after_months(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: u32,
    months_elapsed: u32,
) -> PropCalcResult<Money> {
    let n = total_months(term_years)?;
    if months_elapsed >= n {
        return Ok(Decimal::ZERO);
    }
    let remaining = n - months_elapsed;

    if principal.is_zero() || annual_rate_percent.is_zero() {
        let balance = principal
            .checked_mul(Decimal::from(remaining))
            .ok_or_else(|| overflow("principal"))?
            / Decimal::from(n);
        return Ok(round_money(balance).max(Decimal::ZERO));
    }

    let r = monthly_rate(annual_rate_percent);
    let payment = exact_payment(principal, r, n)?;
    let discount = compound(Decimal::ONE + r, remaining)
        .and_then(|factor| Decimal::ONE.checked_div(factor))
        .ok_or_else(|| overflow("annual_rate_percent"))?;
    let balance = payment
        .checked_mul(Decimal::ONE - discount)
        .and_then(|v| v.checked_div(r))
        .ok_or_else(|| overflow("principal"))?;

    Ok(round_money(balance).max(Decimal::ZERO))
}

/// Month-by-month repayment plan at the rounded monthly payment.
///
/// The last instalment absorbs the rounding residue so the loan closes at
/// exactly zero.
pub fn amortization_schedule(terms: &FinancingTerms) -> PropCalcResult<AmortizationSchedule> {
    let n = total_months(terms.term_years)?;
    let payment = monthly_payment(terms.principal, terms.annual_rate_percent, terms.term_years)?;
    let r = monthly_rate(terms.annual_rate_percent);

    let mut months = Vec::with_capacity(n as usize);
    let mut balance = terms.principal;

    for month in 1..=n {
        let interest = balance.checked_mul(r).ok_or_else(|| overflow("principal"))?;
        let mut principal_part = payment - interest;
        if month == n || principal_part > balance {
            principal_part = balance;
        }
        balance -= principal_part;

        months.push(AmortizationRow {
            month,
            payment: round_money(interest + principal_part),
            interest: round_money(interest),
            principal: round_money(principal_part),
            balance: round_money(balance),
        });

        if balance.is_zero() {
            break;
        }
    }

    let years = roll_up_years(terms.principal, &months);
    let total_interest: Money = months.iter().map(|m| m.interest).sum();
    let total_paid: Money = months.iter().map(|m| m.payment).sum();

    Ok(AmortizationSchedule {
        monthly_payment: payment,
        total_interest,
        total_paid,
        months,
        years,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    annual_rate_percent / dec!(100) / dec!(12)
}

fn total_months(term_years: u32) -> PropCalcResult<u32> {
    term_years
        .checked_mul(12)
        .ok_or_else(|| PropCalcError::InvalidInput {
            field: "term_years".into(),
            reason: "Term is too long to count in months".into(),
        })
}

/// Unrounded annuity payment; `r` must be non-zero.
fn exact_payment(principal: Money, r: Rate, n: u32) -> PropCalcResult<Money> {
    let factor = compound(Decimal::ONE + r, n).ok_or_else(|| overflow("annual_rate_percent"))?;
    principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(factor - Decimal::ONE))
        .ok_or_else(|| overflow("principal"))
}

/// `base^periods` via iterative multiplication; `None` past the decimal range.
pub(crate) fn compound(base: Decimal, periods: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..periods {
        result = result.checked_mul(base)?;
    }
    Some(result)
}

pub(crate) fn overflow(field: &str) -> PropCalcError {
    PropCalcError::InvalidInput {
        field: field.into(),
        reason: "Result exceeds the decimal range".into(),
    }
}

fn roll_up_years(principal: Money, months: &[AmortizationRow]) -> Vec<AmortizationYear> {
    let mut opening = round_money(principal);
    months
        .chunks(12)
        .enumerate()
        .map(|(i, chunk)| {
            let closing = chunk.last().map(|m| m.balance).unwrap_or(opening);
            let year = AmortizationYear {
                year: i as u32 + 1,
                opening_balance: opening,
                interest_paid: chunk.iter().map(|m| m.interest).sum(),
                principal_paid: chunk.iter().map(|m| m.principal).sum(),
                closing_balance: closing,
            };
            opening = closing;
            year
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_payment_standard_mortgage() {
        // 200k at 4% over 30 years: 954.83
        let pmt = monthly_payment(dec!(200000), dec!(4), 30).unwrap();
        assert_eq!(pmt, dec!(954.83));
    }

    #[test]
    fn test_monthly_payment_zero_rate_is_straight_line() {
        let pmt = monthly_payment(dec!(120000), dec!(0), 30).unwrap();
        assert_eq!(pmt, dec!(120000) / dec!(360));
    }

    #[test]
    fn test_monthly_payment_zero_principal() {
        assert_eq!(monthly_payment(dec!(0), dec!(3.5), 25).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_monthly_payment_zero_term() {
        assert_eq!(monthly_payment(dec!(100000), dec!(3), 0).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_at_start_equals_principal() {
        assert_eq!(remaining_balance(dec!(200000), dec!(4), 30, 0).unwrap(), dec!(200000));
    }

    #[test]
    fn test_remaining_balance_after_term_is_zero() {
        assert_eq!(remaining_balance(dec!(200000), dec!(4), 30, 30).unwrap(), Decimal::ZERO);
        assert_eq!(remaining_balance(dec!(200000), dec!(4), 30, 45).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_known_value() {
        // 200k, 4%, 30y: balance after 10 years is about 157,568
        let bal = remaining_balance(dec!(200000), dec!(4), 30, 10).unwrap();
        assert!((bal - dec!(157568)).abs() < dec!(50), "got {bal}");
    }

    #[test]
    fn test_remaining_balance_zero_rate_linear() {
        let bal = remaining_balance(dec!(120000), dec!(0), 30, 10).unwrap();
        assert_eq!(bal, dec!(80000));
    }

    #[test]
    fn test_remaining_balance_monthly_granularity() {
        let yearly = remaining_balance(dec!(150000), dec!(3), 20, 2).unwrap();
        let monthly = remaining_balance_after_months(dec!(150000), dec!(3), 20, 24).unwrap();
        assert_eq!(yearly, monthly);
        let later = remaining_balance_after_months(dec!(150000), dec!(3), 20, 25).unwrap();
        assert!(later < monthly);
    }

    #[test]
    fn test_schedule_closes_at_zero() {
        let terms = FinancingTerms::new(dec!(100000), dec!(3.5), 15);
        let schedule = amortization_schedule(&terms).unwrap();
        assert_eq!(schedule.months.len(), 180);
        assert_eq!(schedule.months.last().unwrap().balance, Decimal::ZERO);
        assert_eq!(schedule.years.len(), 15);
        assert_eq!(schedule.years[0].opening_balance, dec!(100000));
        assert_eq!(schedule.years.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_schedule_zero_term_is_empty() {
        let schedule = amortization_schedule(&FinancingTerms::new(dec!(1000), dec!(2), 0)).unwrap();
        assert!(schedule.months.is_empty());
        assert!(schedule.years.is_empty());
        assert_eq!(schedule.total_paid, Decimal::ZERO);
    }

    #[test]
    fn test_annual_debt_service_rounds_to_cents() {
        // 48000 / 144 months = 333.33..., twelve of them
        let terms = FinancingTerms::new(dec!(48000), dec!(0), 12);
        assert_eq!(annual_debt_service(&terms).unwrap(), dec!(4000.00));
    }

    #[test]
    fn test_compounding_overflow_is_rejected() {
        assert!(matches!(
            monthly_payment(dec!(100000), dec!(200), 50),
            Err(PropCalcError::InvalidInput { .. })
        ));
        assert!(remaining_balance(dec!(100000), dec!(200), 50, 5).is_err());
        assert!(amortization_schedule(&FinancingTerms::new(dec!(100000), dec!(200), 50)).is_err());
    }

    #[test]
    fn test_term_too_long_for_months_is_rejected() {
        assert!(matches!(
            monthly_payment(dec!(100000), dec!(3), u32::MAX),
            Err(PropCalcError::InvalidInput { .. })
        ));
    }
}
