use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SolverPolicy;
use crate::error::PropCalcError;
use crate::types::{Money, Percent, Rate};
use crate::PropCalcResult;

/// Starting rate used by every caller that does not pick its own.
pub const DEFAULT_IRR_GUESS: Rate = dec!(0.10);

/// A converged IRR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Unrounded rate as a decimal fraction
    pub rate: Rate,
    /// Rate as a percentage rounded half-up to one decimal
    pub rate_percent: Percent,
    pub iterations: u32,
}

/// IRR result that never fails: the best-effort percentage plus flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutcome {
    pub rate_percent: Percent,
    pub converged: bool,
    /// Converged and within the plausibility threshold of the solver policy
    pub reliable: bool,
    pub iterations: u32,
}

/// Net Present Value of a series of annual cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PropCalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(PropCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    npv_and_derivative(cash_flows, rate)
        .map(|(value, _)| value)
        .ok_or_else(|| PropCalcError::InvalidInput {
            field: "cash_flows".into(),
            reason: "NPV overflowed the decimal range".into(),
        })
}

/// Internal Rate of Return using Newton-Raphson with the default solver policy.
///
/// `cash_flows[0]` is the (negative) initial outlay; any exit value must
/// already be folded into the last flow. A zero outlay returns 0%.
pub fn solve_irr(cash_flows: &[Money], initial_guess: Rate) -> PropCalcResult<IrrSolution> {
    let policy = SolverPolicy {
        initial_guess,
        ..SolverPolicy::default()
    };
    solve_irr_with(cash_flows, &policy)
}

/// Strict IRR: fails with `ConvergenceFailure` when the iteration budget runs
/// out, the derivative vanishes, or the decimal range overflows.
pub fn solve_irr_with(cash_flows: &[Money], policy: &SolverPolicy) -> PropCalcResult<IrrSolution> {
    let run = newton_raphson(cash_flows, policy);
    if run.converged {
        Ok(IrrSolution {
            rate: run.rate,
            rate_percent: rate_to_percent(run.rate),
            iterations: run.iterations,
        })
    } else {
        Err(PropCalcError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: run.iterations,
            last_npv: run.last_npv,
            best_effort: run.rate,
        })
    }
}

/// Best-effort IRR percentage. Never fails: after the iteration budget the
/// last rate reached is returned, converged or not.
pub fn irr_percent(cash_flows: &[Money], initial_guess: Rate) -> Percent {
    let policy = SolverPolicy {
        initial_guess,
        ..SolverPolicy::default()
    };
    irr_outcome(cash_flows, &policy).rate_percent
}

/// Best-effort IRR with convergence and plausibility flags.
pub fn irr_outcome(cash_flows: &[Money], policy: &SolverPolicy) -> IrrOutcome {
    let run = newton_raphson(cash_flows, policy);
    let rate_percent = rate_to_percent(run.rate);
    let reliable = run.converged && rate_percent.abs() <= policy.unreliable_above_percent;
    if run.converged && !reliable {
        warn!(%rate_percent, "IRR converged outside the plausible range");
    }
    IrrOutcome {
        rate_percent,
        converged: run.converged,
        reliable,
        iterations: run.iterations,
    }
}

// ---------------------------------------------------------------------------
// Newton-Raphson
// ---------------------------------------------------------------------------

struct SolverRun {
    rate: Rate,
    iterations: u32,
    converged: bool,
    last_npv: Decimal,
}

fn newton_raphson(cash_flows: &[Money], policy: &SolverPolicy) -> SolverRun {
    if cash_flows.first().map_or(true, |cf| cf.is_zero()) {
        return SolverRun {
            rate: Decimal::ZERO,
            iterations: 0,
            converged: true,
            last_npv: Decimal::ZERO,
        };
    }

    let mut rate = policy.initial_guess;
    let mut last_npv = Decimal::ZERO;

    for i in 1..=policy.max_iterations {
        let Some((npv_val, dnpv)) = npv_and_derivative(cash_flows, rate) else {
            warn!(iterations = i, %rate, "IRR: decimal overflow, returning last rate");
            return stalled(rate, i, last_npv);
        };

        let Some(step) = npv_val.checked_div(dnpv) else {
            warn!(iterations = i, %rate, "IRR: zero derivative, returning last rate");
            return stalled(rate, i, npv_val);
        };

        let Some(new_rate) = rate.checked_sub(step) else {
            return stalled(rate, i, npv_val);
        };
        last_npv = npv_val;

        if step.abs() < policy.tolerance {
            debug!(iterations = i, rate = %new_rate, "IRR converged");
            return SolverRun {
                rate: new_rate,
                iterations: i,
                converged: true,
                last_npv,
            };
        }

        rate = new_rate;
    }

    warn!(
        iterations = policy.max_iterations,
        %rate,
        "IRR did not converge, returning last rate"
    );
    stalled(rate, policy.max_iterations, last_npv)
}

fn stalled(rate: Rate, iterations: u32, last_npv: Decimal) -> SolverRun {
    SolverRun {
        rate,
        iterations,
        converged: false,
        last_npv,
    }
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
/// `None` when the decimal range overflows or 1 + r is zero.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        let pv = cf.checked_mul(discount)?;
        npv = npv.checked_add(pv)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = Decimal::from(t as i64)
                .checked_mul(pv)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}

/// `round(r * 1000) / 10`, saturating for runaway rates.
fn rate_to_percent(rate: Rate) -> Percent {
    match rate
        .checked_mul(dec!(1000))
        .and_then(|v| v.checked_add(dec!(0.5)))
    {
        Some(scaled) => scaled.floor() / dec!(10),
        None if rate.is_sign_negative() => Decimal::MIN / dec!(10),
        None => Decimal::MAX / dec!(10),
    }
}
