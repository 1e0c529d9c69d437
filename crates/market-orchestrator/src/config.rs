use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use valuation_engine::MonteCarloConfig;

/// Runtime settings for the fragmentation engine, read from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub monte_carlo_runs: usize,
    pub monte_carlo_seed: u64,
    pub source_timeout_secs: u64,
    /// Number of simulated directory sources fanned out to
    pub simulated_sources: usize,
    pub max_businesses: usize,
    pub top_targets: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monte_carlo_runs: 1000,
            monte_carlo_seed: 42,
            source_timeout_secs: 10,
            simulated_sources: 2,
            max_businesses: 100,
            top_targets: 15,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let monte_carlo_runs: usize = env::var("MONTE_CARLO_RUNS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .context("MONTE_CARLO_RUNS must be a positive integer")?;
        if monte_carlo_runs == 0 {
            anyhow::bail!("MONTE_CARLO_RUNS must be at least 1");
        }

        Ok(Self {
            monte_carlo_runs,
            monte_carlo_seed: env::var("MONTE_CARLO_SEED")
                .unwrap_or_else(|_| "42".to_string())
                .parse()
                .context("MONTE_CARLO_SEED must be an unsigned integer")?,
            source_timeout_secs: env::var("SOURCE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("SOURCE_TIMEOUT_SECS must be an unsigned integer")?,
            simulated_sources: env::var("SIMULATED_SOURCES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("SIMULATED_SOURCES must be an unsigned integer")?,
            max_businesses: env::var("MAX_BUSINESSES")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("MAX_BUSINESSES must be an unsigned integer")?,
            top_targets: env::var("TOP_TARGETS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .context("TOP_TARGETS must be an unsigned integer")?,
        })
    }

    pub fn monte_carlo(&self) -> MonteCarloConfig {
        MonteCarloConfig {
            runs: self.monte_carlo_runs,
            seed: self.monte_carlo_seed,
        }
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}
