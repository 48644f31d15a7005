use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Instant;
use tracing::{debug, warn};

use crate::amortization::{annual_debt_service, overflow, remaining_balance};
use crate::config::PolicyConfig;
use crate::error::PropCalcError;
use crate::metrics::cash_on_cash;
use crate::partners::{
    InvestmentPartner, PartnerAllocationInput, PartnerAllocationOutput, PartnerMetrics,
    PartnerTotals,
};
use crate::projection::indexed_amount;
use crate::time_value::irr_outcome;
use crate::types::{round_half_up, round_money, with_metadata, ComputationOutput, Money};
use crate::PropCalcResult;

/// Splits one property's investment, rent and exit among co-owners.
pub struct PartnerAllocationEngine<'a> {
    policy: &'a PolicyConfig,
}

impl<'a> PartnerAllocationEngine<'a> {
    pub fn new(policy: &'a PolicyConfig) -> Self {
        Self { policy }
    }

    /// Per-partner equity, rent, exit value and IRR.
    ///
    /// Shares are checked before anything is computed: a sum outside
    /// `100 ± allocation_tolerance` (an empty list included) is rejected.
    pub fn allocate(
        &self,
        input: &PartnerAllocationInput,
    ) -> PropCalcResult<ComputationOutput<PartnerAllocationOutput>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        self.check_shares(&input.partners)?;
        if input.exit_year == 0 {
            return Err(PropCalcError::InvalidInput {
                field: "exit_year".into(),
                reason: "Exit year must be at least 1".into(),
            });
        }
        debug!(
            partners = input.partners.len(),
            exit_year = input.exit_year,
            "allocating partner returns"
        );

        let mut partners = Vec::with_capacity(input.partners.len());
        for partner in &input.partners {
            let metrics = self.partner_metrics(input, partner)?;
            if !metrics.irr_converged {
                warnings.push(format!(
                    "IRR for {} did not converge; {}% is a best-effort value",
                    metrics.name, metrics.irr_percent
                ));
            }
            if metrics.annual_rent < Decimal::ZERO {
                warnings.push(format!(
                    "{} has a negative year-1 cashflow of {}",
                    metrics.name, metrics.annual_rent
                ));
            }
            partners.push(metrics);
        }

        let totals = PartnerTotals {
            own_equity: partners.iter().map(|p| p.own_equity).sum(),
            annual_rent: partners.iter().map(|p| p.annual_rent).sum(),
            exit_value: partners.iter().map(|p| p.exit_value).sum(),
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Pro-rata partner allocation with individually financed shares",
            input,
            warnings,
            elapsed,
            PartnerAllocationOutput { partners, totals },
        ))
    }

    fn check_shares(&self, partners: &[InvestmentPartner]) -> PropCalcResult<()> {
        let total: Decimal = partners.iter().map(|p| p.percentage_share).sum();
        if partners.is_empty()
            || (total - dec!(100)).abs() > self.policy.partners.allocation_tolerance
        {
            warn!(%total, partners = partners.len(), "rejecting partner allocation");
            return Err(PropCalcError::InvalidAllocation { total });
        }
        Ok(())
    }

    fn partner_metrics(
        &self,
        input: &PartnerAllocationInput,
        partner: &InvestmentPartner,
    ) -> PropCalcResult<PartnerMetrics> {
        let share = partner.percentage_share / dec!(100);
        let financing = partner.own_financing.clone().unwrap_or_default();
        let own_equity =
            round_money((input.total_investment * share - financing.principal).max(Decimal::ZERO));

        let annual_debt_service = annual_debt_service(&financing)?;
        let opex_share = input.annual_opex * share;

        let rent_in_year = |year: u32| -> PropCalcResult<Money> {
            let debt = if year <= financing.term_years {
                annual_debt_service
            } else {
                Decimal::ZERO
            };
            let rent = indexed_amount(input.annual_gross_rent, input.indexation_percent, year)?;
            Ok(round_money(rent * share - opex_share - debt))
        };

        let exit_value = round_money(
            input.sale_price * share
                - remaining_balance(
                    financing.principal,
                    financing.annual_rate_percent,
                    financing.term_years,
                    input.exit_year,
                )?,
        );

        let mut cashflows: Vec<Money> = Vec::with_capacity(input.exit_year as usize + 1);
        cashflows.push(-own_equity);
        for year in 1..=input.exit_year {
            cashflows.push(rent_in_year(year)?);
        }
        if let Some(last) = cashflows.last_mut() {
            *last = last
                .checked_add(exit_value)
                .ok_or_else(|| overflow("sale_price"))?;
        }

        let irr = irr_outcome(&cashflows, &self.policy.solver);
        let annual_rent = rent_in_year(1)?;

        Ok(PartnerMetrics {
            name: partner.name.clone(),
            percentage_share: partner.percentage_share,
            own_equity,
            monthly_rent: round_money(annual_rent / dec!(12)),
            annual_rent,
            cash_on_cash_percent: round_half_up(cash_on_cash(annual_rent, own_equity), 2),
            exit_value,
            irr_percent: irr.rate_percent,
            irr_converged: irr.converged,
            cashflows,
        })
    }
}

/// [`PartnerAllocationEngine::allocate`] under the default policy.
pub fn allocate_partners(
    input: &PartnerAllocationInput,
) -> PropCalcResult<ComputationOutput<PartnerAllocationOutput>> {
    PartnerAllocationEngine::new(&PolicyConfig::default()).allocate(input)
}
