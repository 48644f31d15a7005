use clap::Args;
use serde_json::Value;

use propcalc_core::config::PolicyConfig;
use propcalc_core::scenarios::{ScenarioEngine, ScenarioInput};

use crate::input;

/// Arguments for the rental-vs-sale comparison
#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to JSON ScenarioInput file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_scenarios(
    args: ScenariosArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario_input: ScenarioInput =
        input::read_record(args.input.as_deref(), "scenario analysis")?;
    let result = ScenarioEngine::new(policy).analyze(&scenario_input)?;
    Ok(serde_json::to_value(result)?)
}
