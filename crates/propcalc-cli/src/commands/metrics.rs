use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use propcalc_core::config::PolicyConfig;
use propcalc_core::metrics::{analyze_returns_with, ReturnMetricsInput};

use crate::input;

/// Arguments for single-period return metrics
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Purchase price plus acquisition costs (defaults to the purchase price)
    #[arg(long)]
    pub total_investment: Option<Decimal>,

    #[arg(long)]
    pub own_capital: Option<Decimal>,

    #[arg(long)]
    pub annual_gross_rent: Option<Decimal>,

    /// Rent at full occupancy, for break-even
    #[arg(long)]
    pub max_gross_income: Option<Decimal>,

    #[arg(long, default_value = "0")]
    pub annual_opex: Decimal,

    #[arg(long, default_value = "0")]
    pub annual_debt_service: Decimal,
}

pub fn run_metrics(args: MetricsArgs, policy: &PolicyConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let metrics_input: ReturnMetricsInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let price = args
            .purchase_price
            .ok_or("--purchase-price is required (or provide --input)")?;
        ReturnMetricsInput {
            purchase_price: price,
            total_investment: args.total_investment.unwrap_or(price),
            own_capital: args
                .own_capital
                .ok_or("--own-capital is required (or provide --input)")?,
            annual_gross_rent: args
                .annual_gross_rent
                .ok_or("--annual-gross-rent is required (or provide --input)")?,
            max_achievable_gross_income: args.max_gross_income,
            annual_opex: args.annual_opex,
            annual_debt_service: args.annual_debt_service,
        }
    };

    let result = analyze_returns_with(&metrics_input, policy);
    Ok(serde_json::to_value(result)?)
}
