//! Chaos-adjusted consolidation opportunity score.

use market_core::stats::clamp_unit;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

const HIGH_ENTROPY: f64 = 0.8;
const HIGH_CHAOTIC_RATIO: f64 = 0.3;
const VOLATILE_INDUSTRIES: &[&str] = &["restaurant", "bar", "nightlife", "seasonal", "tourism"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreAdjustment {
    pub reason: String,
    pub factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationScore {
    pub base: f64,
    pub adjusted: f64,
    pub adjustments: Vec<ScoreAdjustment>,
}

fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

fn is_volatile_industry(industry: &str) -> bool {
    industry
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .any(|t| {
            let singular = t.strip_suffix('s').unwrap_or(t);
            VOLATILE_INDUSTRIES.contains(&t) || VOLATILE_INDUSTRIES.contains(&singular)
        })
}

/// `(1 - hhi_normalized) * 100 + mom_pop_density * 50`, then compounded
/// market-chaos discounts in fixed order. `hhi_normalized` is HHI / 10000.
pub fn chaos_adjusted_score(
    hhi_normalized: f64,
    mom_pop_density: f64,
    market_entropy: Option<f64>,
    chaotic_actor_ratio: Option<f64>,
    industry: &str,
) -> ConsolidationScore {
    let base = (1.0 - clamp_unit(hhi_normalized)) * 100.0 + clamp_unit(mom_pop_density) * 50.0;
    let mut adjusted = base;
    let mut adjustments = Vec::new();

    if market_entropy.is_some_and(|e| e > HIGH_ENTROPY) {
        adjusted *= 0.85;
        adjustments.push(ScoreAdjustment {
            reason: "High market entropy".to_string(),
            factor: 0.85,
        });
    }
    if chaotic_actor_ratio.is_some_and(|r| r > HIGH_CHAOTIC_RATIO) {
        adjusted *= 0.9;
        adjustments.push(ScoreAdjustment {
            reason: "Many chaotic operators".to_string(),
            factor: 0.9,
        });
    }
    if is_volatile_industry(industry) {
        adjusted *= 0.95;
        adjustments.push(ScoreAdjustment {
            reason: format!("Volatile industry ({industry})"),
            factor: 0.95,
        });
    }

    ConsolidationScore {
        base: round2(base),
        adjusted: round2(adjusted),
        adjustments,
    }
}
