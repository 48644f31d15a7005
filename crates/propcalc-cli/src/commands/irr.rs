use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use propcalc_core::config::{PolicyConfig, SolverPolicy};
use propcalc_core::time_value::{irr_outcome, npv, solve_irr_with};
use propcalc_core::types::with_metadata;

/// Arguments for the internal rate of return
#[derive(Args)]
pub struct IrrArgs {
    /// Annual cash flows, outlay first (comma-separated, e.g. "-100,10,110")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,

    /// Starting rate as a decimal fraction (policy default when omitted)
    #[arg(long, allow_hyphen_values = true)]
    pub guess: Option<Decimal>,

    /// Fail instead of returning a best-effort rate when the solver does not converge
    #[arg(long)]
    pub strict: bool,

    /// Also report NPV at this decimal rate
    #[arg(long)]
    pub discount_rate: Option<Decimal>,
}

pub fn run_irr(args: IrrArgs, policy: &PolicyConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let solver = SolverPolicy {
        initial_guess: args.guess.unwrap_or(policy.solver.initial_guess),
        ..policy.solver.clone()
    };

    let mut warnings = Vec::new();
    let mut result = if args.strict {
        serde_json::to_value(solve_irr_with(&args.cash_flows, &solver)?)?
    } else {
        let outcome = irr_outcome(&args.cash_flows, &solver);
        if !outcome.converged {
            warnings.push(format!(
                "IRR did not converge after {} iterations; best-effort value reported",
                outcome.iterations
            ));
        }
        serde_json::to_value(outcome)?
    };

    if let (Some(rate), Value::Object(map)) = (args.discount_rate, &mut result) {
        map.insert("npv".into(), serde_json::to_value(npv(rate, &args.cash_flows)?)?);
    }

    let output = with_metadata(
        "Newton-Raphson IRR on annual cash flows",
        &args.cash_flows,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
