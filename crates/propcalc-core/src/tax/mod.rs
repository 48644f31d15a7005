pub mod estimator;
pub mod income;
pub mod transfer;

use serde::{Deserialize, Serialize};

use crate::config::{JurisdictionTaxPolicy, TaxPolicy};

pub use estimator::{compare_jurisdictions, estimate_taxes, TaxEstimator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jurisdiction {
    Portugal,
    Netherlands,
}

/// Use class that selects the transfer-tax table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyUse {
    PrimaryResidence,
    SecondaryResidence,
    NonResidential,
}

/// How the rental income is earned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalRegime {
    #[default]
    LongTermLease,
    ShortStay,
}

impl TaxPolicy {
    pub fn for_jurisdiction(&self, jurisdiction: Jurisdiction) -> &JurisdictionTaxPolicy {
        match jurisdiction {
            Jurisdiction::Portugal => &self.portugal,
            Jurisdiction::Netherlands => &self.netherlands,
        }
    }
}
