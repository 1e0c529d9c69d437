//! Consolidation target scoring and ranking.

use crate::operational::{assess, signals_from_observation};
use crate::review_chaos::MarketChaosSummary;
use market_core::BusinessObservation;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_TOP_N: usize = 15;
pub const BASE_ACQUISITION_MULTIPLE: f64 = 1.2;
pub const COST_SYNERGY_RATE: f64 = 0.05;
pub const REVENUE_SYNERGY_RATE: f64 = 0.08;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringOptions {
    pub top_n: usize,
    /// Add the operational-health bonus to strategic value
    pub include_operational: bool,
    /// Market-level competitor density fed to each business's assessment
    pub competitor_density: f64,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            include_operational: true,
            competitor_density: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationTarget {
    pub business_id: String,
    pub name: String,
    pub address: String,
    pub estimated_revenue: Option<f64>,
    pub exit_risk: f64,
    pub strategic_value: f64,
    pub acquisition_complexity: f64,
    pub composite_score: f64,
    pub estimated_acquisition_cost: f64,
    pub cost_synergies: f64,
    pub revenue_synergies: f64,
    pub total_synergies: f64,
    pub operational_score: Option<f64>,
    pub chaos_score: Option<f64>,
    pub rank: usize,
    pub rationale: Vec<String>,
}

/// Owner-exit likelihood in [0, 1].
pub fn exit_risk(b: &BusinessObservation) -> f64 {
    let mut score: f64 = 0.0;
    match b.owner_age {
        Some(age) if age > 65 => score += 0.4,
        Some(age) if age > 55 => score += 0.2,
        _ => {}
    }
    if b.business_age.is_some_and(|a| a > 20.0) {
        score += 0.2;
    }
    if b.average_rating.is_some_and(|r| r < 3.5) {
        score += 0.2;
    }
    if b.review_count.is_some_and(|c| c < 20) {
        score += 0.1;
    }
    if b.employees.is_some_and(|e| e < 5) {
        score += 0.1;
    }
    score.min(1.0)
}

/// Platform value in [0, 1]; `operational_total` is a 0-100 AOA score.
pub fn strategic_value(b: &BusinessObservation, operational_total: Option<f64>) -> f64 {
    let mut score: f64 = 0.0;
    match b.estimated_revenue {
        Some(r) if r > 1_000_000.0 => score += 0.3,
        Some(r) if r > 500_000.0 => score += 0.2,
        Some(_) => score += 0.1,
        None => {}
    }
    if b.review_count.is_some_and(|c| c > 100) {
        score += 0.2;
    }
    if b.average_rating.is_some_and(|r| r > 4.0) {
        score += 0.2;
    }
    if b.employees.is_some_and(|e| e > 5) {
        score += 0.1;
    }
    if b.business_age.is_some_and(|a| (5.0..=15.0).contains(&a)) {
        score += 0.2;
    }
    if let Some(total) = operational_total {
        score += 0.1 * (total / 100.0).clamp(0.0, 1.0);
    }
    score.min(1.0)
}

pub fn acquisition_complexity(b: &BusinessObservation) -> f64 {
    let mut score: f64 = 0.2;
    match b.employees {
        Some(e) if e > 20 => score += 0.2,
        Some(e) if e > 10 => score += 0.1,
        _ => {}
    }
    match b.estimated_revenue {
        Some(r) if r > 2_000_000.0 => score += 0.2,
        Some(r) if r > 1_000_000.0 => score += 0.1,
        _ => {}
    }
    match b.business_age {
        Some(a) if a > 25.0 => score += 0.15,
        Some(a) if a > 15.0 => score += 0.1,
        _ => {}
    }
    match b.average_rating {
        Some(r) if r > 4.7 => score += 0.15,
        Some(r) if r > 4.5 => score += 0.1,
        _ => {}
    }
    score.min(1.0)
}

pub fn acquisition_multiple(b: &BusinessObservation) -> f64 {
    let mut multiple = BASE_ACQUISITION_MULTIPLE;
    match b.average_rating {
        Some(r) if r > 4.5 => multiple += 0.3,
        Some(r) if r > 4.0 => multiple += 0.15,
        _ => {}
    }
    match b.business_age {
        Some(a) if a > 15.0 => multiple += 0.2,
        Some(a) if a > 10.0 => multiple += 0.1,
        _ => {}
    }
    match b.employees {
        Some(e) if e > 20 => multiple += 0.3,
        Some(e) if e > 10 => multiple += 0.15,
        _ => {}
    }
    multiple
}

pub fn composite_score(exit_risk: f64, strategic_value: f64, complexity: f64) -> f64 {
    0.4 * exit_risk + 0.4 * strategic_value + 0.2 * (1.0 - complexity)
}

fn rationale(b: &BusinessObservation, exit: f64, strategic: f64, complexity: f64) -> Vec<String> {
    let mut reasons = Vec::new();
    if let Some(age) = b.owner_age.filter(|a| *a > 55) {
        reasons.push(format!("Owner age {age} suggests near-term succession"));
    }
    if exit >= 0.5 {
        reasons.push("Elevated exit likelihood".to_string());
    }
    if strategic >= 0.6 {
        reasons.push("Strong platform candidate".to_string());
    }
    if complexity <= 0.3 {
        reasons.push("Low integration complexity".to_string());
    } else if complexity >= 0.6 {
        reasons.push("Premium asset; expect competitive bidding".to_string());
    }
    if b.estimated_revenue.is_none() {
        reasons.push("Revenue unknown; cost and synergy estimates are zero".to_string());
    }
    reasons
}

pub struct ConsolidationScorer {
    options: ScoringOptions,
}

impl ConsolidationScorer {
    pub fn new(options: ScoringOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScoringOptions {
        &self.options
    }

    /// Score a single business. `rank` is left at 0 until ranking.
    pub fn score(&self, b: &BusinessObservation, operational_total: Option<f64>) -> ConsolidationTarget {
        let exit = exit_risk(b);
        let strategic = strategic_value(b, operational_total);
        let complexity = acquisition_complexity(b);
        let revenue = b.estimated_revenue.unwrap_or(0.0);
        let cost_synergies = revenue * COST_SYNERGY_RATE;
        let revenue_synergies = revenue * REVENUE_SYNERGY_RATE;

        ConsolidationTarget {
            business_id: b.id.clone(),
            name: b.name.clone(),
            address: b.address.clone(),
            estimated_revenue: b.estimated_revenue,
            exit_risk: exit,
            strategic_value: strategic,
            acquisition_complexity: complexity,
            composite_score: composite_score(exit, strategic, complexity),
            estimated_acquisition_cost: revenue * acquisition_multiple(b),
            cost_synergies,
            revenue_synergies,
            total_synergies: cost_synergies + revenue_synergies,
            operational_score: operational_total,
            chaos_score: None,
            rank: 0,
            rationale: rationale(b, exit, strategic, complexity),
        }
    }

    /// Score every business, rank by composite (ties by revenue), keep the top N.
    pub fn rank(&self, businesses: &[BusinessObservation], chaos: Option<&MarketChaosSummary>) -> Vec<ConsolidationTarget> {
        let chaos_by_id: HashMap<&str, f64> = chaos
            .map(|summary| {
                summary
                    .businesses
                    .iter()
                    .map(|c| (c.business_id.as_str(), c.chaos_score))
                    .collect()
            })
            .unwrap_or_default();

        let mut targets: Vec<ConsolidationTarget> = businesses
            .iter()
            .map(|b| {
                let operational = self
                    .options
                    .include_operational
                    .then(|| assess(&signals_from_observation(b, self.options.competitor_density)).total);
                let mut target = self.score(b, operational);
                target.chaos_score = chaos_by_id.get(b.id.as_str()).copied();
                target
            })
            .collect();

        targets.sort_by(|a, b| {
            b.composite_score
                .total_cmp(&a.composite_score)
                .then_with(|| {
                    let ra = a.estimated_revenue.unwrap_or(0.0);
                    let rb = b.estimated_revenue.unwrap_or(0.0);
                    rb.partial_cmp(&ra).unwrap_or(Ordering::Equal)
                })
        });
        targets.truncate(self.options.top_n);
        for (i, target) in targets.iter_mut().enumerate() {
            target.rank = i + 1;
        }

        debug!(
            scored = businesses.len(),
            returned = targets.len(),
            "Ranked consolidation targets"
        );
        targets
    }
}

impl Default for ConsolidationScorer {
    fn default() -> Self {
        Self::new(ScoringOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn biz(id: &str) -> BusinessObservation {
        BusinessObservation::new(id, format!("Biz {id}"), "78701", "plumbing")
    }

    #[test]
    fn retiring_owner_maxes_exit_risk() {
        let b = biz("a")
            .with_owner_age(70)
            .with_business_age(25.0)
            .with_reviews_summary(10, 3.0)
            .with_employees(3);
        assert_relative_eq!(exit_risk(&b), 1.0);
    }

    #[test]
    fn absent_fields_contribute_nothing() {
        let b = biz("a");
        assert_eq!(exit_risk(&b), 0.0);
        assert_eq!(strategic_value(&b, None), 0.0);
        assert_relative_eq!(acquisition_complexity(&b), 0.2);
        assert_relative_eq!(acquisition_multiple(&b), BASE_ACQUISITION_MULTIPLE);
        let target = ConsolidationScorer::default().score(&b, None);
        assert_eq!(target.estimated_acquisition_cost, 0.0);
        assert_eq!(target.total_synergies, 0.0);
    }

    #[test]
    fn strategic_value_tiers_and_cap() {
        let b = biz("a")
            .with_revenue(1_500_000.0)
            .with_reviews_summary(150, 4.6)
            .with_employees(8)
            .with_business_age(10.0);
        // 0.3 + 0.2 + 0.2 + 0.1 + 0.2 = 1.0 before the operational bonus
        assert_relative_eq!(strategic_value(&b, None), 1.0);
        assert_relative_eq!(strategic_value(&b, Some(100.0)), 1.0);

        let small = biz("b").with_revenue(300_000.0);
        assert_relative_eq!(strategic_value(&small, Some(50.0)), 0.1 + 0.05);
    }

    #[test]
    fn acquisition_cost_and_synergies() {
        let b = biz("a")
            .with_revenue(1_000_000.0)
            .with_reviews_summary(80, 4.8)
            .with_business_age(12.0)
            .with_employees(25);
        let t = ConsolidationScorer::default().score(&b, None);
        assert_relative_eq!(t.estimated_acquisition_cost, 1_000_000.0 * (1.2 + 0.3 + 0.1 + 0.3), epsilon = 1e-6);
        assert_relative_eq!(t.cost_synergies, 50_000.0);
        assert_relative_eq!(t.revenue_synergies, 80_000.0);
        assert_relative_eq!(t.total_synergies, 130_000.0);
    }

    #[test]
    fn ranking_orders_by_composite_then_revenue() {
        let businesses = vec![
            biz("low").with_revenue(100_000.0),
            biz("tie_small").with_revenue(200_000.0).with_owner_age(70),
            biz("tie_big").with_revenue(400_000.0).with_owner_age(70),
        ];
        let scorer = ConsolidationScorer::new(ScoringOptions {
            include_operational: false,
            ..Default::default()
        });
        let ranked = scorer.rank(&businesses, None);
        let ids: Vec<&str> = ranked.iter().map(|t| t.business_id.as_str()).collect();
        assert_eq!(ids, vec!["tie_big", "tie_small", "low"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn ranking_truncates_to_top_n() {
        let businesses: Vec<_> = (0..30).map(|i| biz(&i.to_string()).with_revenue(i as f64 * 1000.0)).collect();
        let ranked = ConsolidationScorer::default().rank(&businesses, None);
        assert_eq!(ranked.len(), DEFAULT_TOP_N);
        for pair in ranked.windows(2) {
            assert!(pair[0].composite_score >= pair[1].composite_score);
        }
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let b = biz("x")
            .with_revenue(5_000_000.0)
            .with_employees(50)
            .with_business_age(40.0)
            .with_reviews_summary(500, 4.9)
            .with_owner_age(80);
        let t = ConsolidationScorer::default().score(&b, Some(100.0));
        for v in [t.exit_risk, t.strategic_value, t.acquisition_complexity, t.composite_score] {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
