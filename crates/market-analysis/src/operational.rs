//! Automated Operational Assessment (AOA)
//!
//! Six capped pillars summing to a 100-point operational-health score, a
//! letter grade, and a separate owner-transition risk estimate.
//!
//! `quick_operational_score` is a deliberately simpler single-pass proxy used
//! inside the Monte Carlo loop. It weighs signals differently from the full
//! assessment and the two are kept as separate functions.

use market_core::stats::{clamp_unit, coefficient_of_variation};
use market_core::{BusinessObservation, OperationalSignals};
use serde::{Deserialize, Serialize};

pub const SERVICE_QUALITY_MAX: f64 = 25.0;
pub const DEMAND_MOMENTUM_MAX: f64 = 15.0;
pub const CAPACITY_MAX: f64 = 15.0;
pub const COMPETITIVE_POSITION_MAX: f64 = 15.0;
pub const UNIT_ECONOMICS_MAX: f64 = 20.0;
pub const COMPLIANCE_MAX: f64 = 10.0;

/// Transition risk at or above this is reported as high
pub const HIGH_TRANSITION_RISK: f64 = 60.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PillarScores {
    pub service_quality: f64,
    pub demand_momentum: f64,
    pub capacity_reliability: f64,
    pub competitive_position: f64,
    pub unit_economics: f64,
    pub compliance_risk: f64,
}

impl PillarScores {
    pub fn total(&self) -> f64 {
        self.service_quality
            + self.demand_momentum
            + self.capacity_reliability
            + self.competitive_position
            + self.unit_economics
            + self.compliance_risk
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AoaResult {
    pub pillars: PillarScores,
    pub total: f64,
    pub grade: String,
    pub insights: Vec<String>,
    pub risk_flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRisk {
    /// 0-100
    pub score: f64,
    pub factors: Vec<String>,
    pub succession_probability: f64,
}

impl TransitionRisk {
    pub fn is_high(&self) -> bool {
        self.score >= HIGH_TRANSITION_RISK
    }
}

/// Descending threshold table; anything below the last threshold is a D.
const GRADE_TABLE: &[(f64, &str)] = &[
    (90.0, "A+"),
    (85.0, "A"),
    (80.0, "A-"),
    (75.0, "B+"),
    (70.0, "B"),
    (65.0, "B-"),
    (60.0, "C+"),
    (55.0, "C"),
    (50.0, "C-"),
];

pub fn grade_for(total: f64) -> &'static str {
    GRADE_TABLE
        .iter()
        .find(|(threshold, _)| total >= *threshold)
        .map(|(_, grade)| *grade)
        .unwrap_or("D")
}

fn service_quality(s: &OperationalSignals) -> f64 {
    let rating = match s.average_rating {
        r if r >= 4.7 => 12.0,
        r if r >= 4.5 => 10.0,
        r if r >= 4.0 => 7.0,
        r if r >= 3.5 => 4.0,
        _ => 1.0,
    };
    let volume = match s.review_count {
        c if c >= 200 => 8.0,
        c if c >= 100 => 6.0,
        c if c >= 50 => 4.0,
        c if c >= 20 => 2.0,
        _ => 1.0,
    };
    let stability = match s.rating_std_dev {
        v if v < 0.5 => 5.0,
        v if v < 1.0 => 3.0,
        v if v < 1.5 => 1.0,
        _ => 0.0,
    };
    f64::min(rating + volume + stability, SERVICE_QUALITY_MAX)
}

fn demand_momentum(s: &OperationalSignals) -> f64 {
    let velocity = match s.review_velocity_ratio() {
        None => 4.0,
        Some(r) if r >= 1.5 => 8.0,
        Some(r) if r >= 1.1 => 6.0,
        Some(r) if r >= 0.9 => 4.0,
        Some(r) if r >= 0.6 => 2.0,
        Some(_) => 0.0,
    };
    let trend = match s.interest_trend_ratio() {
        None => 3.0,
        Some(r) if r >= 1.2 => 7.0,
        Some(r) if r >= 1.0 => 5.0,
        Some(r) if r >= 0.8 => 3.0,
        Some(_) => 1.0,
    };
    f64::min(velocity + trend, DEMAND_MOMENTUM_MAX)
}

fn capacity_reliability(s: &OperationalSignals) -> f64 {
    let age = match s.business_age_years {
        a if a >= 10.0 => 8.0,
        a if a >= 5.0 => 6.0,
        a if a >= 2.0 => 4.0,
        _ => 2.0,
    };
    let counts: Vec<f64> = s.monthly_review_counts.iter().map(|c| *c as f64).collect();
    let consistency = if counts.len() < 2 || counts.iter().all(|c| *c == 0.0) {
        3.0
    } else {
        match coefficient_of_variation(&counts) {
            cv if cv < 0.3 => 7.0,
            cv if cv < 0.6 => 5.0,
            cv if cv < 1.0 => 3.0,
            _ => 1.0,
        }
    };
    f64::min(age + consistency, CAPACITY_MAX)
}

fn competitive_position(s: &OperationalSignals) -> f64 {
    let inverse_density = (1.0 - clamp_unit(s.competitor_density)) * 8.0;
    let digital = clamp_unit(s.digital_presence) * 7.0;
    f64::min(inverse_density + digital, COMPETITIVE_POSITION_MAX)
}

fn unit_economics(s: &OperationalSignals) -> f64 {
    let cac_tier = match (s.cac, s.average_ticket) {
        (Some(cac), Some(ticket)) if ticket > 0.0 => match cac / ticket {
            r if r <= 0.1 => 12.0,
            r if r <= 0.2 => 9.0,
            r if r <= 0.35 => 6.0,
            r if r <= 0.5 => 3.0,
            _ => 0.0,
        },
        (Some(_), Some(_)) => 0.0,
        _ => 6.0,
    };
    let margin_tier = match s.gross_margin {
        Some(m) if m >= 0.5 => 8.0,
        Some(m) if m >= 0.35 => 6.0,
        Some(m) if m >= 0.2 => 4.0,
        Some(_) => 1.0,
        None => 4.0,
    };
    f64::min(cac_tier + margin_tier, UNIT_ECONOMICS_MAX)
}

fn compliance_risk(s: &OperationalSignals) -> f64 {
    let mut score = COMPLIANCE_MAX;
    if s.business_age_years < 2.0 {
        score -= 3.0;
    }
    if s.interest_trend_ratio().is_some_and(|r| r < 0.9) {
        score -= 3.0;
    }
    if s.competitor_density > 0.7 {
        score -= 3.0;
    }
    score.max(0.0)
}

/// Full six-pillar assessment.
pub fn assess(signals: &OperationalSignals) -> AoaResult {
    let pillars = PillarScores {
        service_quality: service_quality(signals),
        demand_momentum: demand_momentum(signals),
        capacity_reliability: capacity_reliability(signals),
        competitive_position: competitive_position(signals),
        unit_economics: unit_economics(signals),
        compliance_risk: compliance_risk(signals),
    };
    let total = pillars.total().clamp(0.0, 100.0);

    let mut insights = Vec::new();
    let mut risk_flags = Vec::new();

    if pillars.service_quality >= 20.0 {
        insights.push("Strong service reputation with consistent ratings".to_string());
    } else if signals.average_rating < 3.5 {
        risk_flags.push(format!("Low average rating ({:.1})", signals.average_rating));
    }
    if signals.rating_std_dev >= 1.5 {
        risk_flags.push("Highly inconsistent customer experience".to_string());
    }
    match signals.review_velocity_ratio() {
        Some(r) if r >= 1.1 => insights.push(format!("Review velocity up {:.0}% year over year", (r - 1.0) * 100.0)),
        Some(r) if r < 0.8 => risk_flags.push(format!("Review velocity down {:.0}% year over year", (1.0 - r) * 100.0)),
        _ => {}
    }
    if signals.interest_trend_ratio().is_some_and(|r| r < 0.9) {
        risk_flags.push("Declining market interest".to_string());
    }
    if signals.competitor_density > 0.7 {
        risk_flags.push("Crowded competitive field".to_string());
    }
    if signals.digital_presence < 0.3 {
        insights.push("Digital presence is thin; low-cost upside from listings and website".to_string());
    }
    if pillars.unit_economics >= 15.0 {
        insights.push("Healthy acquisition cost relative to ticket size".to_string());
    } else if pillars.unit_economics < 8.0 {
        risk_flags.push("Unit economics under pressure".to_string());
    }
    if signals.business_age_years < 2.0 {
        risk_flags.push("Limited operating history".to_string());
    }

    AoaResult {
        pillars,
        total,
        grade: grade_for(total).to_string(),
        insights,
        risk_flags,
    }
}

/// Additive owner-transition risk, capped at 100.
pub fn assess_transition_risk(signals: &OperationalSignals) -> TransitionRisk {
    let mut score: f64 = 0.0;
    let mut factors = Vec::new();

    if signals.business_age_years > 20.0 {
        score += 30.0;
        factors.push(format!("Long owner tenure ({:.0} years)", signals.business_age_years));
    }
    if signals.review_velocity_ratio().is_some_and(|r| r < 0.8) {
        score += 25.0;
        factors.push("Review velocity declining against historical average".to_string());
    }
    if signals.competitor_density > 0.7 {
        score += 20.0;
        factors.push("High competitor density".to_string());
    }
    if signals.interest_trend_ratio().is_some_and(|r| r < 0.9) {
        score += 25.0;
        factors.push("Market interest trending down".to_string());
    }

    let score = score.min(100.0);
    TransitionRisk {
        score,
        factors,
        succession_probability: score / 100.0,
    }
}

/// Single-pass 0-100 quality proxy for the valuation loop.
pub fn quick_operational_score(signals: &OperationalSignals) -> f64 {
    let rating = (signals.average_rating / 5.0).clamp(0.0, 1.0) * 40.0;
    let volume = (signals.review_count as f64 / 200.0).min(1.0) * 20.0;
    let tenure = (signals.business_age_years / 10.0).clamp(0.0, 1.0) * 15.0;
    let position = (1.0 - clamp_unit(signals.competitor_density)) * 15.0;
    let digital = clamp_unit(signals.digital_presence) * 10.0;
    (rating + volume + tenure + position + digital).clamp(0.0, 100.0)
}

/// EBITDA multiplier in [0.7, 1.3] derived from the quick score.
pub fn quick_operational_multiplier(signals: &OperationalSignals) -> f64 {
    (0.7 + 0.6 * quick_operational_score(signals) / 100.0).clamp(0.7, 1.3)
}

/// Derive operational signals from a directory observation.
///
/// Directory data carries no funnel economics or interest history, so those
/// signals stay unknown and score at their neutral tiers.
pub fn signals_from_observation(business: &BusinessObservation, competitor_density: f64) -> OperationalSignals {
    let ratings: Vec<f64> = business.reviews.iter().map(|r| r.rating).collect();
    let review_count = business.review_count.unwrap_or(business.reviews.len() as u32);
    let age = business.business_age.unwrap_or(0.0);
    let reviews_last_12m = if age > 0.0 {
        (review_count as f64 / age.max(1.0)).round() as u32
    } else {
        review_count
    };
    OperationalSignals {
        average_rating: business
            .average_rating
            .unwrap_or_else(|| if ratings.is_empty() { 3.0 } else { market_core::stats::mean(&ratings) })
            .clamp(1.0, 5.0),
        review_count,
        rating_std_dev: market_core::stats::population_std_dev(&ratings),
        reviews_last_12m,
        reviews_prior_12m: None,
        current_interest: None,
        average_interest: None,
        business_age_years: age,
        monthly_review_counts: Vec::new(),
        competitor_density: clamp_unit(competitor_density),
        digital_presence: clamp_unit(business.data_quality),
        cac: None,
        average_ticket: None,
        gross_margin: None,
    }
}
