use clap::Args;
use serde_json::Value;

use propcalc_core::config::PolicyConfig;
use propcalc_core::partners::{PartnerAllocationEngine, PartnerAllocationInput};

use crate::input;

/// Arguments for co-ownership allocation
#[derive(Args)]
pub struct PartnersArgs {
    /// Path to JSON PartnerAllocationInput file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_partners(
    args: PartnersArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let allocation_input: PartnerAllocationInput =
        input::read_record(args.input.as_deref(), "partner allocation")?;
    let result = PartnerAllocationEngine::new(policy).allocate(&allocation_input)?;
    Ok(serde_json::to_value(result)?)
}
