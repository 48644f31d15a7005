use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Instant;
use tracing::debug;

use crate::amortization::{annual_debt_service, monthly_payment, remaining_balance};
use crate::config::{PolicyConfig, RatingBands};
use crate::error::PropCalcError;
use crate::metrics::{break_even_occupancy_percent, cash_on_cash, debt_service_coverage_ratio};
use crate::projection::{payback_year, project_cashflows, ProjectionInput};
use crate::scenarios::ranking::get_best_scenario;
use crate::scenarios::{
    LongTermAssumptions, RentalScenario, SaleAssumptions, SaleScenario, ScenarioAnalysis,
    ScenarioInput, ScenarioResult, ShortStayAssumptions,
};
use crate::time_value::irr_outcome;
use crate::types::{
    round_half_up, round_money, with_metadata, ComputationOutput, CoverageRatio, FinancingTerms,
    Money, Percent, PropertyFinancials,
};
use crate::PropCalcResult;

/// Builds and ranks the long-term, short-stay and sale strategies of one property.
pub struct ScenarioEngine<'a> {
    policy: &'a PolicyConfig,
}

/// Figures shared by every strategy of one property.
struct Acquisition {
    purchase_price: Money,
    own_capital: Money,
    financing: FinancingTerms,
    annual_debt_service: Money,
}

impl<'a> ScenarioEngine<'a> {
    pub fn new(policy: &'a PolicyConfig) -> Self {
        Self { policy }
    }

    pub fn analyze(&self, input: &ScenarioInput) -> PropCalcResult<ComputationOutput<ScenarioAnalysis>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        validate_input(input)?;

        let property = &input.property;
        let data = &input.scenarios;
        let acquisition = self.acquisition(property)?;
        debug!(
            own_capital = %acquisition.own_capital,
            debt_service = %acquisition.annual_debt_service,
            "analyzing scenarios"
        );

        let long_term = self.long_term(&data.long_term, &acquisition);
        let short_stay = self.short_stay(&data.short_stay, &acquisition);
        let sale = self.sale(&data.sale, &acquisition)?;

        if long_term.net_cashflow < Decimal::ZERO {
            warnings.push(format!(
                "Long-term rental runs a negative cashflow of {} per year",
                long_term.net_cashflow
            ));
        }
        if short_stay.net_cashflow < Decimal::ZERO {
            warnings.push(format!(
                "Short-stay rental runs a negative cashflow of {} per year",
                short_stay.net_cashflow
            ));
        }
        if sale.net_sale_proceeds < Decimal::ZERO {
            warnings.push("Sale proceeds do not cover the outstanding loan".into());
        }
        if acquisition.own_capital.is_zero() {
            warnings.push("Own capital is zero; cash-on-cash and return on equity reported as 0".into());
        }

        let mut long_term_projection = None;
        let mut long_term_irr = None;
        let mut payback = None;
        if let Some(years) = data.holding_years.filter(|&y| y > 0) {
            let rows = project_cashflows(&ProjectionInput {
                annual_gross_rent: long_term.gross_annual_income,
                annual_opex: long_term.operating_expenses,
                rent_indexation_percent: data.rent_indexation_percent,
                opex_indexation_percent: data.rent_indexation_percent,
                own_capital: acquisition.own_capital,
                financing: acquisition.financing.clone(),
                years,
            })?;

            let exit = self.sale_at(&data.sale, &acquisition, years, None)?;
            let mut flows: Vec<Money> = Vec::with_capacity(rows.len());
            flows.push(-acquisition.own_capital);
            flows.extend(rows.iter().skip(1).map(|r| r.net_cashflow));
            if let Some(last) = flows.last_mut() {
                *last += exit.net_sale_proceeds;
            }

            let outcome = irr_outcome(&flows, &self.policy.solver);
            if !outcome.converged {
                warnings.push(format!(
                    "Long-term IRR did not converge after {} iterations; {}% is a best-effort value",
                    outcome.iterations, outcome.rate_percent
                ));
            } else if !outcome.reliable {
                warnings.push(format!(
                    "Long-term IRR of {}% is outside the plausible range",
                    outcome.rate_percent
                ));
            }

            payback = payback_year(&rows);
            long_term_projection = Some(rows);
            long_term_irr = Some(outcome);
        }

        let scenarios = vec![
            ScenarioResult::LongTermRental(long_term),
            ScenarioResult::ShortStay(short_stay),
            ScenarioResult::Sale(sale),
        ];
        let best_scenario = get_best_scenario(&scenarios, data.ranking).map(|s| s.kind());

        let analysis = ScenarioAnalysis {
            total_investment: property.total_investment(),
            loan_amount: acquisition.financing.principal,
            own_capital: acquisition.own_capital,
            monthly_payment: monthly_payment(
                acquisition.financing.principal,
                acquisition.financing.annual_rate_percent,
                acquisition.financing.term_years,
            )?,
            scenarios,
            best_scenario,
            ranking: data.ranking,
            long_term_projection,
            long_term_irr,
            payback_year: payback,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Long-term rental vs short-stay vs sale, first-year figures",
            input,
            warnings,
            elapsed,
            analysis,
        ))
    }

    fn acquisition(&self, property: &PropertyFinancials) -> PropCalcResult<Acquisition> {
        let financing = property.resolved_financing();
        Ok(Acquisition {
            purchase_price: property.purchase_price,
            own_capital: property.own_capital(),
            annual_debt_service: annual_debt_service(&financing)?,
            financing,
        })
    }

    fn long_term(&self, a: &LongTermAssumptions, acq: &Acquisition) -> RentalScenario {
        let max_income = a.monthly_rent * dec!(12);
        let gross = max_income * a.occupancy_percent / dec!(100);
        let base_opex = a.annual_opex.unwrap_or_else(|| {
            gross * self.policy.scenarios.default_long_term_opex_percent / dec!(100)
        });
        rental_scenario(
            gross,
            max_income,
            base_opex,
            Decimal::ZERO,
            acq,
            &self.policy.ratings.long_term_cash_on_cash,
        )
    }

    fn short_stay(&self, a: &ShortStayAssumptions, acq: &Acquisition) -> RentalScenario {
        let max_income = a.average_daily_rate * dec!(365);
        let gross = max_income * a.occupancy_percent / dec!(100);
        let policy = &self.policy.scenarios;
        let base_opex = a
            .annual_opex
            .unwrap_or_else(|| gross * policy.default_short_stay_opex_percent / dec!(100));
        let extra = a
            .extra_operating_costs
            .unwrap_or_else(|| gross * policy.short_stay_extra_cost_percent / dec!(100));
        rental_scenario(
            gross,
            max_income,
            base_opex,
            extra,
            acq,
            &self.policy.ratings.short_stay_cash_on_cash,
        )
    }

    fn sale(&self, a: &SaleAssumptions, acq: &Acquisition) -> PropCalcResult<SaleScenario> {
        self.sale_at(a, acq, a.years_since_purchase, a.outstanding_loan_balance)
    }

    /// Sale after `years` of ownership. Without an explicit balance the loan
    /// is taken from the amortization plan at that point.
    fn sale_at(
        &self,
        a: &SaleAssumptions,
        acq: &Acquisition,
        years: u32,
        outstanding: Option<Money>,
    ) -> PropCalcResult<SaleScenario> {
        let policy = &self.policy.scenarios;
        let selling_pct = a
            .selling_costs_percent
            .unwrap_or(policy.default_selling_costs_percent);
        let gains_rate = a
            .capital_gains_rate_percent
            .unwrap_or(policy.capital_gains_rate_percent);

        let selling_costs = round_money(a.sale_price * selling_pct / dec!(100));
        let capital_gain = (a.sale_price - acq.purchase_price).max(Decimal::ZERO);
        let capital_gains_tax = round_money(capital_gain * gains_rate / dec!(100));
        let outstanding_loan_balance = match outstanding {
            Some(balance) => balance,
            None => remaining_balance(
                acq.financing.principal,
                acq.financing.annual_rate_percent,
                acq.financing.term_years,
                years,
            )?,
        };

        let net_sale_proceeds =
            a.sale_price - selling_costs - capital_gains_tax - outstanding_loan_balance;
        let return_on_equity = return_on_equity(net_sale_proceeds, acq.own_capital);

        let net_cashflow = Decimal::ZERO - acq.annual_debt_service;
        Ok(SaleScenario {
            gross_annual_income: Decimal::ZERO,
            operating_expenses: Decimal::ZERO,
            net_operating_income: Decimal::ZERO,
            annual_debt_service: acq.annual_debt_service,
            net_cashflow,
            cash_on_cash_percent: round_half_up(cash_on_cash(net_cashflow, acq.own_capital), 2),
            sale_price: a.sale_price,
            selling_costs,
            capital_gain,
            capital_gains_tax,
            outstanding_loan_balance,
            net_sale_proceeds,
            return_on_equity_percent: round_half_up(return_on_equity, 2),
            years_since_purchase: years,
            rating: self.policy.ratings.sale_return_on_equity.rate(return_on_equity),
        })
    }
}

/// [`ScenarioEngine::analyze`] under the default policy.
pub fn analyze_scenarios(input: &ScenarioInput) -> PropCalcResult<ComputationOutput<ScenarioAnalysis>> {
    ScenarioEngine::new(&PolicyConfig::default()).analyze(input)
}

/// `(proceeds - own_capital) / own_capital * 100`; 0 without equity.
pub fn return_on_equity(net_sale_proceeds: Money, own_capital: Money) -> Percent {
    if own_capital.is_zero() {
        return Decimal::ZERO;
    }
    (net_sale_proceeds - own_capital) / own_capital * dec!(100)
}

fn rental_scenario(
    gross: Money,
    max_income: Money,
    base_opex: Money,
    extra: Money,
    acq: &Acquisition,
    bands: &RatingBands,
) -> RentalScenario {
    let opex = base_opex + extra;
    let noi = gross - opex;
    let net = noi - acq.annual_debt_service;
    let coc = cash_on_cash(net, acq.own_capital);

    RentalScenario {
        gross_annual_income: round_money(gross),
        base_operating_expenses: round_money(base_opex),
        extra_operating_costs: round_money(extra),
        operating_expenses: round_money(opex),
        annual_debt_service: acq.annual_debt_service,
        net_operating_income: round_money(noi),
        net_cashflow: round_money(net),
        cash_on_cash_percent: round_half_up(coc, 2),
        debt_service_coverage: match debt_service_coverage_ratio(noi, acq.annual_debt_service) {
            CoverageRatio::Finite(v) => CoverageRatio::Finite(round_half_up(v, 2)),
            CoverageRatio::Infinite => CoverageRatio::Infinite,
        },
        break_even_occupancy_percent: round_half_up(
            break_even_occupancy_percent(opex, acq.annual_debt_service, max_income),
            2,
        ),
        rating: bands.rate(coc),
    }
}

fn validate_input(input: &ScenarioInput) -> PropCalcResult<()> {
    input.property.validate()?;
    check_occupancy("long_term.occupancy_percent", input.scenarios.long_term.occupancy_percent)?;
    check_occupancy("short_stay.occupancy_percent", input.scenarios.short_stay.occupancy_percent)?;
    Ok(())
}

fn check_occupancy(field: &str, value: Percent) -> PropCalcResult<()> {
    if value < Decimal::ZERO || value > dec!(100) {
        return Err(PropCalcError::InvalidInput {
            field: field.into(),
            reason: "Occupancy must be between 0 and 100".into(),
        });
    }
    Ok(())
}
