pub mod ad_spend;
pub mod batch;
pub mod estimators;
pub mod geography;
pub mod market_potential;
pub mod models;
pub mod monte_carlo;
pub mod service;
#[cfg(test)]
mod tests;

pub use ad_spend::{plan_ad_spend, AdSpendPlan, Funding, KeywordPlan};
pub use batch::{process_csv, BatchReport, BatchRowError, BatchRowResult, BatchSummary};
pub use geography::{geography_multiplier, NATIONAL_MEDIAN_INCOME};
pub use market_potential::{assess_market_potential, MarketPotential};
pub use models::*;
pub use monte_carlo::{run, run_with_rng};
pub use service::{BusinessValuation, ValuationService};
