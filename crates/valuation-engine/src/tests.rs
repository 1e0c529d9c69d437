use std::sync::Arc;

use approx::assert_relative_eq;
use market_core::{AdsObservation, BusinessSignals, CategoryPriorTable, MarketError, OperationalSignals};

use crate::*;

/// Helper: a well-documented restaurant with every signal present.
fn restaurant() -> BusinessSignals {
    BusinessSignals {
        business_name: "Luigi's Trattoria".to_string(),
        industry: "Restaurant".to_string(),
        zip_code: "60614".to_string(),
        operational: OperationalSignals {
            average_rating: 4.4,
            review_count: 640,
            rating_std_dev: 0.8,
            reviews_last_12m: 120,
            reviews_prior_12m: Some(170),
            current_interest: Some(85.0),
            average_interest: Some(100.0),
            business_age_years: 22.0,
            monthly_review_counts: vec![10, 12, 14, 11, 13, 15, 12, 14, 11, 12, 13, 13],
            competitor_density: 0.75,
            digital_presence: 0.6,
            cac: Some(25.0),
            average_ticket: Some(45.0),
            gross_margin: Some(0.62),
        },
        ads: (0..3)
            .map(|i| AdsObservation {
                monthly_volume: 3000.0 + i as f64 * 500.0,
                cpc: 1.5,
                competition: 0.7,
            })
            .collect(),
        popularity_index: Some(70.0),
        median_income: Some(95_000.0),
        population: Some(60_000),
    }
}

fn service(runs: usize) -> ValuationService {
    ValuationService::new(Arc::new(CategoryPriorTable::builtin()), MonteCarloConfig { runs, seed: 42 })
}

#[test]
fn full_bundle_is_populated() {
    let result = service(500).valuate(&restaurant(), None).unwrap();
    assert_eq!(result.prior_key, "restaurant");
    assert_eq!(result.valuation.runs, 500);
    assert_eq!(result.valuation.seed, Some(42));
    assert!(result.market_potential.is_some());
    assert!(result.ad_spend.is_some());

    let w = result.valuation.weights;
    assert_relative_eq!(w.review + w.ads + w.foot_traffic, 1.0, epsilon = 1e-12);
    assert!(w.review > w.foot_traffic);
}

#[test]
fn declining_long_tenured_owner_flags_transition_risk() {
    let result = service(100).valuate(&restaurant(), None).unwrap();
    // tenure, falling reviews, crowded market, falling interest
    assert_relative_eq!(result.transition_risk.score, 100.0);
    assert_eq!(result.transition_risk.factors.len(), 4);
}

#[test]
fn seed_override_is_reproducible() {
    let svc = service(300);
    let a = svc.valuate(&restaurant(), Some(9)).unwrap();
    let b = svc.valuate(&restaurant(), Some(9)).unwrap();
    let c = svc.valuate(&restaurant(), Some(10)).unwrap();
    assert_eq!(a.valuation.valuation, b.valuation.valuation);
    assert_ne!(a.valuation.valuation.p50, c.valuation.valuation.p50);
}

#[test]
fn unknown_industry_uses_default_prior() {
    let mut signals = restaurant();
    signals.industry = "Underwater Basket Weaving".to_string();
    let result = service(100).valuate(&signals, None).unwrap();
    assert_eq!(result.prior_key, "default");
}

#[test]
fn missing_name_is_rejected() {
    let mut signals = restaurant();
    signals.business_name = "  ".to_string();
    let err = service(100).valuate(&signals, None).unwrap_err();
    assert_eq!(err, MarketError::MissingInput("business_name".to_string()));
}

#[test]
fn operational_quality_lifts_ebitda() {
    let mut weak = restaurant();
    weak.operational.average_rating = 2.0;
    weak.operational.review_count = 5;
    weak.operational.digital_presence = 0.0;
    let strong = service(300).valuate(&restaurant(), None).unwrap();
    let weak = service(300).valuate(&weak, None).unwrap();
    assert!(strong.valuation.operational_multiplier > weak.valuation.operational_multiplier);
    // revenue is independent of the operational multiplier
    assert_eq!(strong.valuation.revenue, weak.valuation.revenue);
    assert!(strong.valuation.ebitda.p50 > weak.valuation.ebitda.p50);
}
