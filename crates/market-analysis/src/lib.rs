pub mod concentration;
pub mod consolidation;
pub mod entropy;
pub mod operational;
pub mod projections;
pub mod review_chaos;
pub mod targets;
#[cfg(test)]
mod tests;

pub use concentration::{
    calculate_market_metrics, gini_coefficient, hhi, market_shares, mom_pop_density,
    ConcentrationLevel, MarketMetrics, MarketShare, MomPopPolicy,
};
pub use consolidation::{chaos_adjusted_score, ConsolidationScore, ScoreAdjustment};
pub use entropy::{industry_competitiveness, EntropyCalculator, EntropyMetrics};
pub use operational::{
    assess, assess_transition_risk, grade_for, quick_operational_multiplier,
    quick_operational_score, signals_from_observation, AoaResult, PillarScores, TransitionRisk,
};
pub use projections::{project_portfolio, FinancialProjections};
pub use review_chaos::{
    BusinessChaos, MarketChaosSummary, ReviewChaosAnalyzer, ReviewChaosScore, TemporalPattern,
    Trend,
};
pub use targets::{ConsolidationScorer, ConsolidationTarget, ScoringOptions};
