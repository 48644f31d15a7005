use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::scenarios::ScenarioResult;

/// How scenarios are put on one scoring axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Rentals score by cash-on-cash percent, the sale by net proceeds in
    /// currency. The axis mixes units; kept for output compatibility.
    #[default]
    Legacy,
    /// Rentals score by cash-on-cash, the sale by return on equity per year held.
    AnnualizedReturn,
}

impl ScenarioResult {
    pub fn score(&self, mode: RankingMode) -> Decimal {
        match (self, mode) {
            (ScenarioResult::LongTermRental(r) | ScenarioResult::ShortStay(r), _) => {
                r.cash_on_cash_percent
            }
            (ScenarioResult::Sale(s), RankingMode::Legacy) => s.net_sale_proceeds,
            (ScenarioResult::Sale(s), RankingMode::AnnualizedReturn) => {
                let years = s.years_since_purchase.max(1);
                s.return_on_equity_percent / Decimal::from(years)
            }
        }
    }
}

/// Highest-scoring scenario; on a tie the earlier one wins.
pub fn get_best_scenario(results: &[ScenarioResult], mode: RankingMode) -> Option<&ScenarioResult> {
    let mut best: Option<(&ScenarioResult, Decimal)> = None;
    for result in results {
        let score = result.score(mode);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((result, score)),
        }
    }
    best.map(|(result, _)| result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{RentalScenario, SaleScenario, ScenarioKind};
    use crate::types::{CoverageRatio, Rating};
    use rust_decimal_macros::dec;

    fn rental(coc: Decimal) -> RentalScenario {
        RentalScenario {
            gross_annual_income: dec!(12000),
            base_operating_expenses: dec!(2400),
            extra_operating_costs: Decimal::ZERO,
            operating_expenses: dec!(2400),
            annual_debt_service: dec!(6000),
            net_operating_income: dec!(9600),
            net_cashflow: dec!(3600),
            cash_on_cash_percent: coc,
            debt_service_coverage: CoverageRatio::Finite(dec!(1.6)),
            break_even_occupancy_percent: dec!(70),
            rating: Rating::good(),
        }
    }

    fn sale(proceeds: Decimal, roe: Decimal, years: u32) -> SaleScenario {
        SaleScenario {
            gross_annual_income: Decimal::ZERO,
            operating_expenses: Decimal::ZERO,
            net_operating_income: Decimal::ZERO,
            annual_debt_service: dec!(6000),
            net_cashflow: dec!(-6000),
            cash_on_cash_percent: dec!(-10.53),
            sale_price: dec!(300000),
            selling_costs: dec!(15000),
            capital_gain: dec!(100000),
            capital_gains_tax: dec!(28000),
            outstanding_loan_balance: dec!(50000),
            net_sale_proceeds: proceeds,
            return_on_equity_percent: roe,
            years_since_purchase: years,
            rating: Rating::excellent(),
        }
    }

    #[test]
    fn test_legacy_compares_proceeds_against_percentages() {
        let results = vec![
            ScenarioResult::LongTermRental(rental(dec!(6))),
            ScenarioResult::ShortStay(rental(dec!(9))),
            ScenarioResult::Sale(sale(dec!(207000), dec!(245), 10)),
        ];
        let best = get_best_scenario(&results, RankingMode::Legacy).unwrap();
        assert_eq!(best.kind(), ScenarioKind::Sale);
    }

    #[test]
    fn test_annualized_ranks_sale_per_year() {
        let results = vec![
            ScenarioResult::LongTermRental(rental(dec!(6))),
            ScenarioResult::ShortStay(rental(dec!(9))),
            // 45% over 10 years = 4.5% a year
            ScenarioResult::Sale(sale(dec!(207000), dec!(45), 10)),
        ];
        let best = get_best_scenario(&results, RankingMode::AnnualizedReturn).unwrap();
        assert_eq!(best.kind(), ScenarioKind::ShortStay);
    }

    #[test]
    fn test_tie_keeps_first() {
        let results = vec![
            ScenarioResult::LongTermRental(rental(dec!(8))),
            ScenarioResult::ShortStay(rental(dec!(8))),
        ];
        let best = get_best_scenario(&results, RankingMode::Legacy).unwrap();
        assert_eq!(best.kind(), ScenarioKind::LongTermRental);
    }

    #[test]
    fn test_empty_has_no_best() {
        assert!(get_best_scenario(&[], RankingMode::Legacy).is_none());
    }
}
