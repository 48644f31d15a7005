pub mod allocation;

use serde::{Deserialize, Serialize};

use crate::types::{FinancingTerms, Money, Percent};

pub use allocation::{allocate_partners, PartnerAllocationEngine};

/// A co-owner and the mortgage they carry personally, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentPartner {
    pub name: String,
    /// Ownership share, 0..=100; all partners must sum to 100
    pub percentage_share: Percent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub own_financing: Option<FinancingTerms>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerAllocationInput {
    pub total_investment: Money,
    pub partners: Vec<InvestmentPartner>,
    /// Year-1 gross rent of the whole property
    pub annual_gross_rent: Money,
    #[serde(default)]
    pub annual_opex: Money,
    #[serde(default)]
    pub indexation_percent: Percent,
    pub sale_price: Money,
    /// Year in which the property is sold (last year of the cashflow vector)
    pub exit_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerMetrics {
    pub name: String,
    pub percentage_share: Percent,
    pub own_equity: Money,
    /// Year-1 net rent divided by twelve
    pub monthly_rent: Money,
    /// Year-1 net rent after the partner's own debt service
    pub annual_rent: Money,
    pub cash_on_cash_percent: Percent,
    pub exit_value: Money,
    pub irr_percent: Percent,
    pub irr_converged: bool,
    /// Year 0..=exit_year, exit value folded into the last year
    pub cashflows: Vec<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerTotals {
    pub own_equity: Money,
    pub annual_rent: Money,
    pub exit_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerAllocationOutput {
    pub partners: Vec<PartnerMetrics>,
    pub totals: PartnerTotals,
}
