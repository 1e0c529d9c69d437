use market_core::stats::{mean, percentile_sorted, population_std_dev, sorted_copy};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RUNS: usize = 1000;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub runs: usize,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            seed: DEFAULT_SEED,
        }
    }
}

/// Percentile band plus moments of one simulated quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub mean: f64,
    pub std: f64,
}

impl DistributionSummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        let sorted = sorted_copy(samples);
        Self {
            p10: percentile_sorted(&sorted, 10.0),
            p25: percentile_sorted(&sorted, 25.0),
            p50: percentile_sorted(&sorted, 50.0),
            p75: percentile_sorted(&sorted, 75.0),
            p90: percentile_sorted(&sorted, 90.0),
            mean: mean(samples),
            std: population_std_dev(samples),
        }
    }
}

/// Blend weights of the three revenue estimators; always sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub review: f64,
    pub ads: f64,
    pub foot_traffic: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            review: 0.33,
            ads: 0.33,
            foot_traffic: 0.34,
        }
    }
}

impl EnsembleWeights {
    pub fn blend(&self, review: f64, ads: f64, foot_traffic: f64) -> f64 {
        self.review * review + self.ads * ads + self.foot_traffic * foot_traffic
    }
}

/// Mean revenue each estimator produced across all draws
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatorMeans {
    pub review: f64,
    pub ads: f64,
    pub foot_traffic: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    pub revenue: DistributionSummary,
    pub ebitda: DistributionSummary,
    pub valuation: DistributionSummary,
    pub weights: EnsembleWeights,
    pub runs: usize,
    /// None when the caller supplied its own RNG
    pub seed: Option<u64>,
    pub geography_multiplier: f64,
    pub operational_multiplier: f64,
    pub estimator_means: EstimatorMeans,
}
