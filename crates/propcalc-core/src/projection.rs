use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::{annual_debt_service, compound, overflow};
use crate::types::{round_money, FinancingTerms, Money, PeriodCashflow, Percent};
use crate::PropCalcResult;

/// Inputs of an annual-period cashflow projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    /// Year-1 collected gross rent
    pub annual_gross_rent: Money,
    /// Year-1 operating expenses
    pub annual_opex: Money,
    #[serde(default)]
    pub rent_indexation_percent: Percent,
    #[serde(default)]
    pub opex_indexation_percent: Percent,
    /// Equity sunk at acquisition (seeds the cumulative column)
    pub own_capital: Money,
    #[serde(default)]
    pub financing: FinancingTerms,
    pub years: u32,
}

/// `base * (1 + indexation/100)^(year - 1)`: year 1 is never indexed.
pub fn indexed_amount(base: Money, indexation_percent: Percent, year: u32) -> PropCalcResult<Money> {
    let factor = Decimal::ONE + indexation_percent / dec!(100);
    compound(factor, year.saturating_sub(1))
        .and_then(|growth| base.checked_mul(growth))
        .ok_or_else(|| overflow("indexation_percent"))
}

/// Year 0 (acquisition) followed by `years` operating rows.
///
/// Debt service is twelve monthly payments while the loan runs and zero
/// after its term. Amounts are rounded to cents per row; the cumulative
/// column is the running sum of the rounded net flows.
pub fn project_cashflows(input: &ProjectionInput) -> PropCalcResult<Vec<PeriodCashflow>> {
    let annual_debt_service = annual_debt_service(&input.financing)?;

    let mut rows = Vec::with_capacity(input.years as usize + 1);
    let mut cumulative = -input.own_capital;
    rows.push(PeriodCashflow {
        year: 0,
        gross_rent: Decimal::ZERO,
        operating_expenses: Decimal::ZERO,
        debt_service: Decimal::ZERO,
        net_cashflow: Decimal::ZERO,
        cumulative_cashflow: cumulative,
    });

    for year in 1..=input.years {
        let gross_rent = round_money(indexed_amount(
            input.annual_gross_rent,
            input.rent_indexation_percent,
            year,
        )?);
        let operating_expenses = round_money(indexed_amount(
            input.annual_opex,
            input.opex_indexation_percent,
            year,
        )?);
        let debt_service = if year <= input.financing.term_years {
            annual_debt_service
        } else {
            Decimal::ZERO
        };
        let net_cashflow = gross_rent - operating_expenses - debt_service;
        cumulative = cumulative
            .checked_add(net_cashflow)
            .ok_or_else(|| overflow("annual_gross_rent"))?;

        rows.push(PeriodCashflow {
            year,
            gross_rent,
            operating_expenses,
            debt_service,
            net_cashflow,
            cumulative_cashflow: cumulative,
        });
    }

    Ok(rows)
}

/// First operating year whose cumulative cashflow is no longer negative.
pub fn payback_year(rows: &[PeriodCashflow]) -> Option<u32> {
    rows.iter()
        .skip(1)
        .find(|r| r.cumulative_cashflow >= Decimal::ZERO)
        .map(|r| r.year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> ProjectionInput {
        ProjectionInput {
            annual_gross_rent: dec!(12000),
            annual_opex: dec!(2000),
            rent_indexation_percent: dec!(2),
            opex_indexation_percent: dec!(0),
            own_capital: dec!(20000),
            financing: FinancingTerms::new(dec!(60000), dec!(0), 5),
            years: 8,
        }
    }

    #[test]
    fn test_indexed_amount_year_one_unindexed() {
        assert_eq!(indexed_amount(dec!(1000), dec!(2), 1).unwrap(), dec!(1000));
        assert_eq!(
            indexed_amount(dec!(1000), dec!(2), 3).unwrap(),
            dec!(1000) * dec!(1.02) * dec!(1.02)
        );
    }

    #[test]
    fn test_projection_invariants() {
        let rows = project_cashflows(&sample()).unwrap();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].cumulative_cashflow, dec!(-20000));
        for w in rows.windows(2) {
            let cur = &w[1];
            assert_eq!(
                cur.net_cashflow,
                cur.gross_rent - cur.operating_expenses - cur.debt_service
            );
            assert_eq!(
                cur.cumulative_cashflow,
                w[0].cumulative_cashflow + cur.net_cashflow
            );
        }
    }

    #[test]
    fn test_debt_service_stops_after_term() {
        let rows = project_cashflows(&sample()).unwrap();
        // 60000 / 60 months * 12 = 12000 per year
        assert_eq!(rows[5].debt_service, dec!(12000));
        assert_eq!(rows[6].debt_service, Decimal::ZERO);
    }

    #[test]
    fn test_payback_year() {
        let rows = project_cashflows(&sample()).unwrap();
        // Loan years lose money (cumulative -27.5k after year 5), then ~+11.5k/yr
        assert_eq!(payback_year(&rows), Some(8));
        assert_eq!(payback_year(&rows[..8]), None);
    }
}
