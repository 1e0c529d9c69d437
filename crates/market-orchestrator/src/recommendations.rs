use market_analysis::{
    ConcentrationLevel, ConsolidationScore, ConsolidationTarget, EntropyMetrics, FinancialProjections,
    MarketChaosSummary, MarketMetrics, TemporalPattern, Trend,
};

const HIGH_EXIT_RISK: f64 = 0.6;
const HIGH_CHAOTIC_RATIO: f64 = 0.3;
const LOW_DATA_QUALITY: f64 = 0.5;
const FAST_PAYBACK_YEARS: f64 = 3.0;
const SLOW_PAYBACK_YEARS: f64 = 7.0;

/// Everything a recommendation may depend on, borrowed from one analysis.
pub struct RecommendationInputs<'a> {
    pub metrics: &'a MarketMetrics,
    pub consolidation: &'a ConsolidationScore,
    pub entropy: Option<&'a EntropyMetrics>,
    pub chaos: Option<&'a MarketChaosSummary>,
    pub temporal: Option<&'a TemporalPattern>,
    pub targets: &'a [ConsolidationTarget],
    pub projections: &'a FinancialProjections,
    pub data_quality: f64,
}

fn opportunity_label(adjusted_score: f64) -> &'static str {
    if adjusted_score >= 100.0 {
        "exceptional"
    } else if adjusted_score >= 75.0 {
        "strong"
    } else if adjusted_score >= 50.0 {
        "moderate"
    } else {
        "limited"
    }
}

/// Plain-language guidance for an acquirer, most important first.
pub fn build(inputs: &RecommendationInputs<'_>) -> Vec<String> {
    let mut recs = Vec::new();
    let metrics = inputs.metrics;

    recs.push(format!(
        "Roll-up opportunity is {} (consolidation score {:.1})",
        opportunity_label(inputs.consolidation.adjusted),
        inputs.consolidation.adjusted
    ));

    match metrics.concentration_level {
        ConcentrationLevel::Fragmented if metrics.mom_pop_density > 0.5 => recs.push(format!(
            "Highly fragmented market where {:.0}% of operators are owner-run: build a platform and add tuck-ins",
            metrics.mom_pop_density * 100.0
        )),
        ConcentrationLevel::Fragmented => {
            recs.push("Fragmented market with no dominant incumbent: acquire a platform business first".to_string())
        }
        ConcentrationLevel::Moderate => {
            recs.push("Moderately concentrated market: pursue selective tuck-in acquisitions".to_string())
        }
        ConcentrationLevel::Concentrated => recs.push(format!(
            "Top five operators hold {:.0}% of revenue: consolidation upside is limited",
            metrics.top5_share_pct
        )),
    }

    let likely_sellers = inputs
        .targets
        .iter()
        .filter(|t| t.exit_risk >= HIGH_EXIT_RISK)
        .count();
    if likely_sellers > 0 {
        recs.push(format!(
            "{likely_sellers} ranked targets show elevated exit likelihood: prioritize owner outreach"
        ));
    }

    if let Some(top) = inputs.targets.first() {
        recs.push(format!(
            "Lead target: {} (composite {:.2}, est. cost ${:.0})",
            top.name, top.composite_score, top.estimated_acquisition_cost
        ));
    }

    match inputs.projections.payback_years {
        Some(years) if years <= FAST_PAYBACK_YEARS => recs.push(format!(
            "Projected payback of {:.1} years across {} targets",
            years, inputs.projections.target_count
        )),
        Some(years) if years > SLOW_PAYBACK_YEARS => recs.push(format!(
            "Payback of {years:.1} years is slow: negotiate lower multiples or narrow the target list"
        )),
        None if inputs.projections.target_count > 0 => {
            recs.push("Targets produce no positive return at current margins".to_string())
        }
        _ => {}
    }

    if inputs.entropy.is_some_and(|e| e.competitive_intensity > 0.7) {
        recs.push("Competitive intensity is high: budget for customer retention after each close".to_string());
    }

    if let Some(chaos) = inputs.chaos {
        if chaos.chaotic_actor_ratio > HIGH_CHAOTIC_RATIO {
            recs.push(format!(
                "{} operators show service or ownership instability in reviews: diligence review history closely",
                chaos.chaotic_actor_count
            ));
        }
    }

    if let Some(temporal) = inputs.temporal {
        match temporal.trend {
            Trend::Declining => {
                recs.push("Market-wide ratings are declining: operational improvement is a value lever".to_string())
            }
            Trend::Improving => recs.push("Market-wide ratings are improving: expect sellers to price that in".to_string()),
            Trend::Stable => {}
        }
        if temporal.seasonal {
            recs.push("Ratings vary by season: plan staffing and cash flow for slow months".to_string());
        }
    }

    if inputs.data_quality < LOW_DATA_QUALITY || metrics.businesses_with_revenue * 2 < metrics.total_businesses {
        recs.push("Data coverage is thin: validate revenue estimates before committing capital".to_string());
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_analysis::{calculate_market_metrics, chaos_adjusted_score, project_portfolio, MomPopPolicy};
    use market_core::BusinessObservation;

    fn fragmented_metrics() -> MarketMetrics {
        let businesses: Vec<BusinessObservation> = (0..20)
            .map(|i| {
                BusinessObservation::new(format!("b{i}"), format!("Shop {i}"), "30301", "hvac")
                    .with_revenue(300_000.0)
                    .with_employees(4)
                    .with_reviews_summary(20, 4.5)
                    .with_business_age(8.0)
            })
            .collect();
        calculate_market_metrics("30301", "hvac", &businesses, &MomPopPolicy::default()).unwrap()
    }

    #[test]
    fn fragmented_market_reads_as_rollup() {
        let metrics = fragmented_metrics();
        let consolidation = chaos_adjusted_score(metrics.hhi / 10_000.0, metrics.mom_pop_density, None, None, "hvac");
        let projections = project_portfolio(&[], 0.15);
        let recs = build(&RecommendationInputs {
            metrics: &metrics,
            consolidation: &consolidation,
            entropy: None,
            chaos: None,
            temporal: None,
            targets: &[],
            projections: &projections,
            data_quality: 0.9,
        });
        assert!(recs[0].contains("exceptional"));
        assert!(recs[1].contains("owner-run"));
        assert!(!recs.iter().any(|r| r.contains("Data coverage")));
    }

    #[test]
    fn poor_data_is_called_out() {
        let metrics = fragmented_metrics();
        let consolidation = chaos_adjusted_score(0.05, 1.0, None, None, "hvac");
        let projections = project_portfolio(&[], 0.15);
        let recs = build(&RecommendationInputs {
            metrics: &metrics,
            consolidation: &consolidation,
            entropy: None,
            chaos: None,
            temporal: None,
            targets: &[],
            projections: &projections,
            data_quality: 0.2,
        });
        assert!(recs.last().is_some_and(|r| r.contains("Data coverage")));
    }

    #[test]
    fn labels_follow_score_bands() {
        assert_eq!(opportunity_label(120.0), "exceptional");
        assert_eq!(opportunity_label(80.0), "strong");
        assert_eq!(opportunity_label(50.0), "moderate");
        assert_eq!(opportunity_label(10.0), "limited");
    }
}
