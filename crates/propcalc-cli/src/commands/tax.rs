use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use propcalc_core::config::PolicyConfig;
use propcalc_core::tax::estimator::{estimate_taxes, TaxComparisonInput, TaxEstimateInput};
use propcalc_core::tax::{compare_jurisdictions, Jurisdiction, PropertyUse, RentalRegime};

use crate::input;

/// Arguments for a single-jurisdiction tax estimate
#[derive(Args)]
pub struct TaxArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// portugal | netherlands
    #[arg(long, value_parser = input::parse_enum::<Jurisdiction>)]
    pub jurisdiction: Option<Jurisdiction>,

    #[arg(long)]
    pub price: Option<Decimal>,

    /// primary-residence | secondary-residence | non-residential
    #[arg(long, value_parser = input::parse_enum::<PropertyUse>, default_value = "secondary-residence")]
    pub property_use: PropertyUse,

    /// Official assessed value (estimated from the price when omitted)
    #[arg(long)]
    pub assessed_value: Option<Decimal>,

    /// Recurring property tax rate in percent
    #[arg(long)]
    pub recurring_rate: Option<Decimal>,

    #[arg(long, default_value = "0")]
    pub gross_annual_rent: Decimal,

    #[arg(long, default_value = "0")]
    pub contract_years: u32,

    /// long-term-lease | short-stay
    #[arg(long, value_parser = input::parse_enum::<RentalRegime>, default_value = "long-term-lease")]
    pub regime: RentalRegime,
}

pub fn run_tax(args: TaxArgs, policy: &PolicyConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input: TaxEstimateInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        TaxEstimateInput {
            jurisdiction: args
                .jurisdiction
                .ok_or("--jurisdiction is required (or provide --input)")?,
            price: args.price.ok_or("--price is required (or provide --input)")?,
            property_use: args.property_use,
            assessed_value: args.assessed_value,
            recurring_rate_percent: args.recurring_rate,
            gross_annual_rent: args.gross_annual_rent,
            contract_years: args.contract_years,
            regime: args.regime,
        }
    };

    let result = estimate_taxes(&tax_input, policy);
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a cross-jurisdiction comparison
#[derive(Args)]
pub struct TaxCompareArgs {
    /// Path to JSON TaxComparisonInput file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_tax_compare(
    args: TaxCompareArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison: TaxComparisonInput =
        input::read_record(args.input.as_deref(), "tax comparison")?;
    let result = compare_jurisdictions(&comparison, policy)?;
    Ok(serde_json::to_value(result)?)
}
