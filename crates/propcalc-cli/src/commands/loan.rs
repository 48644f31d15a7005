use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use propcalc_core::amortization::{
    amortization_schedule, annual_debt_service, monthly_payment, remaining_balance,
    remaining_balance_after_months,
};
use propcalc_core::types::{with_metadata, FinancingTerms};

use crate::input;

/// Loan terms shared by the payment, balance and schedule commands
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON FinancingTerms file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (3.5 = 3.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub term: Option<u32>,
}

impl LoanArgs {
    fn terms(&self) -> Result<FinancingTerms, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            return input::file::read_json(path);
        }
        if self.principal.is_none() {
            if let Some(data) = input::stdin::read_stdin()? {
                return Ok(serde_json::from_value(data)?);
            }
        }
        let principal = self
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let rate = self.rate.ok_or("--rate is required (or provide --input)")?;
        let term = self.term.ok_or("--term is required (or provide --input)")?;
        Ok(FinancingTerms::new(principal, rate, term))
    }
}

#[derive(Serialize)]
struct PaymentOutput {
    monthly_payment: Decimal,
    annual_debt_service: Decimal,
    total_months: u32,
}

pub fn run_payment(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let terms = args.terms()?;
    let payment = monthly_payment(terms.principal, terms.annual_rate_percent, terms.term_years)?;
    let output = PaymentOutput {
        monthly_payment: payment,
        annual_debt_service: annual_debt_service(&terms)?,
        total_months: terms.total_months(),
    };
    let result = with_metadata(
        "Fixed-rate monthly annuity",
        &terms,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        output,
    );
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the outstanding balance
#[derive(Args)]
pub struct BalanceArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Full years of payments made
    #[arg(long, conflicts_with = "months_elapsed")]
    pub years_elapsed: Option<u32>,

    /// Monthly payments made
    #[arg(long)]
    pub months_elapsed: Option<u32>,
}

#[derive(Serialize)]
struct BalanceOutput {
    remaining_balance: Decimal,
    months_elapsed: u32,
}

pub fn run_balance(args: BalanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let terms = args.loan.terms()?;
    let (balance, months) = match (args.years_elapsed, args.months_elapsed) {
        (_, Some(m)) => (
            remaining_balance_after_months(
                terms.principal,
                terms.annual_rate_percent,
                terms.term_years,
                m,
            )?,
            m,
        ),
        (years, None) => {
            let y = years.ok_or("--years-elapsed or --months-elapsed is required")?;
            (
                remaining_balance(
                    terms.principal,
                    terms.annual_rate_percent,
                    terms.term_years,
                    y,
                )?,
                y.saturating_mul(12),
            )
        }
    };

    let result = with_metadata(
        "Present value of the remaining annuity payments",
        &terms,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        BalanceOutput {
            remaining_balance: balance,
            months_elapsed: months,
        },
    );
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the repayment plan
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Only the yearly rollups, one row per loan year
    #[arg(long)]
    pub yearly: bool,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let terms = args.loan.terms()?;
    let schedule = amortization_schedule(&terms)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let value = if args.yearly {
        serde_json::to_value(with_metadata(
            "Yearly amortization rollup",
            &terms,
            Vec::new(),
            elapsed,
            schedule.years,
        ))?
    } else {
        serde_json::to_value(with_metadata(
            "Monthly amortization schedule",
            &terms,
            Vec::new(),
            elapsed,
            schedule,
        ))?
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flags(principal: Decimal, rate: Decimal, term: u32) -> LoanArgs {
        LoanArgs {
            input: None,
            principal: Some(principal),
            rate: Some(rate),
            term: Some(term),
        }
    }

    #[test]
    fn test_payment_debt_service_in_cents() {
        let value = run_payment(flags(dec!(48000), dec!(0), 12)).unwrap();
        let debt: Decimal =
            serde_json::from_value(value["result"]["annual_debt_service"].clone()).unwrap();
        assert_eq!(debt, dec!(4000));
    }

    #[test]
    fn test_payment_overflow_is_an_error() {
        assert!(run_payment(flags(dec!(100000), dec!(200), 50)).is_err());
    }
}
