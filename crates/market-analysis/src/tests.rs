use approx::assert_relative_eq;
use market_core::{BusinessObservation, MarketError, Review};

use crate::entropy::market_entropy;
use crate::*;

/// Helper: business with a revenue estimate.
fn business(id: &str, revenue: f64) -> BusinessObservation {
    BusinessObservation::new(id, format!("Business {id}"), "30301", "hvac").with_revenue(revenue)
}

/// Helper: small, young, lightly reviewed shop that counts as mom-and-pop.
fn mom_and_pop(id: &str, revenue: f64) -> BusinessObservation {
    business(id, revenue)
        .with_employees(4)
        .with_reviews_summary(12, 4.2)
        .with_business_age(6.0)
}

#[test]
fn five_equal_businesses_hhi_2000() {
    let businesses: Vec<_> = (0..5).map(|i| business(&i.to_string(), 200_000.0)).collect();
    let metrics = calculate_market_metrics("30301", "hvac", &businesses, &MomPopPolicy::default()).unwrap();
    assert_relative_eq!(metrics.hhi, 2000.0, epsilon = 1e-9);
    assert_eq!(metrics.concentration_level, ConcentrationLevel::Moderate);
    assert_relative_eq!(metrics.top5_share_pct, 100.0, epsilon = 1e-9);
    assert_relative_eq!(metrics.gini_coefficient, 0.0, epsilon = 1e-12);
}

#[test]
fn dominant_player_is_concentrated_and_low_entropy() {
    let mut businesses = vec![business("big", 9_500_000.0)];
    businesses.extend((0..5).map(|i| business(&format!("s{i}"), 100_000.0)));
    let metrics = calculate_market_metrics("30301", "hvac", &businesses, &MomPopPolicy::default()).unwrap();
    assert!(metrics.hhi > 9000.0);
    assert_eq!(metrics.concentration_level, ConcentrationLevel::Concentrated);
    assert!(market_entropy(&businesses) < 0.2);
}

#[test]
fn empty_market_is_insufficient_data() {
    let err = calculate_market_metrics("30301", "hvac", &[], &MomPopPolicy::default()).unwrap_err();
    match err {
        MarketError::InsufficientData { zip, industry, .. } => {
            assert_eq!(zip, "30301");
            assert_eq!(industry, "hvac");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn fragmented_mom_and_pop_market_scores_high() {
    let businesses: Vec<_> = (0..20).map(|i| mom_and_pop(&i.to_string(), 150_000.0 + i as f64 * 5_000.0)).collect();
    let metrics = calculate_market_metrics("30301", "hvac", &businesses, &MomPopPolicy::default()).unwrap();
    assert_eq!(metrics.concentration_level, ConcentrationLevel::Fragmented);
    assert_relative_eq!(metrics.mom_pop_density, 1.0);

    let entropy = EntropyCalculator::new("hvac").calculate(&businesses);
    let score = chaos_adjusted_score(
        metrics.hhi / 10_000.0,
        metrics.mom_pop_density,
        Some(entropy.market_entropy),
        None,
        "hvac",
    );
    // near-even split: entropy above 0.8 triggers the first discount
    assert!(entropy.market_entropy > 0.8);
    assert_eq!(score.adjustments.len(), 1);
    assert!(score.adjusted > 100.0);
}

#[test]
fn retiring_owner_ranks_first() {
    let retiring = business("retiring", 400_000.0)
        .with_owner_age(70)
        .with_business_age(25.0)
        .with_reviews_summary(10, 3.0)
        .with_employees(3);
    let steady = business("steady", 400_000.0)
        .with_owner_age(40)
        .with_business_age(8.0)
        .with_reviews_summary(60, 4.3)
        .with_employees(8);
    let targets = ConsolidationScorer::default().rank(&[steady, retiring], None);
    assert_eq!(targets[0].business_id, "retiring");
    assert_relative_eq!(targets[0].exit_risk, 1.0);
}

#[test]
fn pipeline_feeds_projections() {
    let businesses: Vec<_> = (0..8).map(|i| mom_and_pop(&i.to_string(), 250_000.0)).collect();
    let targets = ConsolidationScorer::new(ScoringOptions {
        top_n: 3,
        ..Default::default()
    })
    .rank(&businesses, None);
    let projections = project_portfolio(&targets, 0.15);
    assert_eq!(projections.target_count, 3);
    assert!(projections.total_investment > projections.total_acquisition_cost);
    assert!(projections.payback_years.is_some());
}

#[test]
fn chaos_scores_attach_to_targets() {
    let chaotic_reviews = vec![
        Review::new(5.0, "Under new management, prices went up, overcharged", None, "test"),
        Review::new(1.0, "New owner, quality went downhill and staff was rude", None, "test"),
    ];
    let businesses = vec![
        business("a", 300_000.0).with_reviews(chaotic_reviews),
        business("b", 300_000.0).with_reviews(vec![Review::new(5.0, "Great service", None, "test")]),
    ];
    let summary = ReviewChaosAnalyzer::new().analyze_market(&businesses);
    let targets = ConsolidationScorer::default().rank(&businesses, Some(&summary));
    let a = targets.iter().find(|t| t.business_id == "a").unwrap();
    let b = targets.iter().find(|t| t.business_id == "b").unwrap();
    assert!(a.chaos_score.unwrap() > b.chaos_score.unwrap());
}

#[test]
fn every_score_is_bounded() {
    let businesses: Vec<_> = (0..40)
        .map(|i| {
            business(&i.to_string(), (i * i) as f64 * 10_000.0)
                .with_employees(i % 30)
                .with_reviews_summary(i * 7, 1.0 + (i % 40) as f64 / 10.0)
                .with_business_age((i % 35) as f64)
                .with_owner_age(30 + i)
        })
        .collect();
    let metrics = calculate_market_metrics("30301", "hvac", &businesses, &MomPopPolicy::default()).unwrap();
    assert!((0.0..=10_000.0).contains(&metrics.hhi));
    assert!((0.0..=1.0).contains(&metrics.mom_pop_density));
    assert!((0.0..=1.0).contains(&metrics.gini_coefficient));

    for t in ConsolidationScorer::default().rank(&businesses, None) {
        for v in [t.exit_risk, t.strategic_value, t.acquisition_complexity, t.composite_score] {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
