pub mod irr;
pub mod loan;
pub mod metrics;
pub mod partners;
pub mod scenarios;
pub mod tax;
