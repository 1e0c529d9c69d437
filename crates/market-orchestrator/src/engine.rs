use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use data_sources::{MultiSourceAggregator, SimulatedProvider};
use market_analysis::{
    calculate_market_metrics, chaos_adjusted_score, project_portfolio, ConcentrationLevel, ConsolidationScore,
    ConsolidationScorer, ConsolidationTarget, EntropyCalculator, EntropyMetrics, FinancialProjections,
    MarketChaosSummary, MarketMetrics, MomPopPolicy, ReviewChaosAnalyzer, ScoringOptions, TemporalPattern,
};
use market_core::stats::{clamp_unit, mean};
use market_core::{
    BusinessObservation, BusinessSignals, CategoryPriorTable, DataSourceProvider, MarketError, MarketResult,
    Review,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use valuation_engine::{BusinessValuation, MonteCarloConfig, ValuationService};

use crate::config::EngineConfig;
use crate::recommendations::{self, RecommendationInputs};

/// Businesses counted toward competitor density when entropy is skipped
const DENSITY_SATURATION: f64 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub include_entropy: bool,
    pub max_businesses: usize,
    /// Keyword chaos scoring of review text, plus the market temporal pattern
    pub include_nlp_analysis: bool,
    pub top_targets: usize,
    pub mom_pop_policy: MomPopPolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            include_entropy: true,
            max_businesses: 100,
            include_nlp_analysis: true,
            top_targets: 15,
            mom_pop_policy: MomPopPolicy::default(),
        }
    }
}

impl AnalysisOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_businesses: config.max_businesses,
            top_targets: config.top_targets,
            ..Self::default()
        }
    }
}

/// Complete fragmentation view of one (zip, industry) market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentationAnalysis {
    pub analysis_id: String,
    pub zip_code: String,
    pub industry: String,
    pub analyzed_at: DateTime<Utc>,
    pub metrics: MarketMetrics,
    pub hhi: f64,
    pub hhi_normalized: f64,
    pub concentration_level: ConcentrationLevel,
    pub mom_pop_density: f64,
    pub consolidation_score: ConsolidationScore,
    pub entropy: Option<EntropyMetrics>,
    pub chaos: Option<MarketChaosSummary>,
    pub temporal_pattern: Option<TemporalPattern>,
    pub targets: Vec<ConsolidationTarget>,
    pub projections: FinancialProjections,
    /// 0-1, half source-reported quality and half field completeness
    pub data_quality_score: f64,
    /// Records dropped because they failed validation
    pub rejected_records: usize,
    pub sources: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Share of the scoring-relevant optional fields a record actually carries.
fn completeness(b: &BusinessObservation) -> f64 {
    let present = [
        b.estimated_revenue.is_some(),
        b.employees.is_some(),
        b.review_count.is_some(),
        b.average_rating.is_some(),
        b.business_age.is_some(),
        b.owner_age.is_some(),
    ];
    present.iter().filter(|p| **p).count() as f64 / present.len() as f64
}

pub fn data_quality_score(businesses: &[BusinessObservation]) -> f64 {
    if businesses.is_empty() {
        return 0.0;
    }
    let reported = mean(&businesses.iter().map(|b| b.data_quality).collect::<Vec<_>>());
    let complete = mean(&businesses.iter().map(completeness).collect::<Vec<_>>());
    clamp_unit(0.5 * reported + 0.5 * complete)
}

/// Runs market analyses against an injected data source.
///
/// Holds no per-request state; one engine can serve concurrent callers.
pub struct FragmentationEngine {
    provider: Arc<dyn DataSourceProvider>,
    priors: Arc<CategoryPriorTable>,
    valuation: ValuationService,
}

impl FragmentationEngine {
    pub fn new(
        provider: Arc<dyn DataSourceProvider>,
        priors: Arc<CategoryPriorTable>,
        monte_carlo: MonteCarloConfig,
    ) -> Self {
        Self {
            provider,
            valuation: ValuationService::new(Arc::clone(&priors), monte_carlo),
            priors,
        }
    }

    /// Engine over `simulated_sources` seeded directory sources behind one aggregator.
    pub fn simulated(config: &EngineConfig, as_of: DateTime<Utc>) -> Self {
        let providers: Vec<Arc<dyn DataSourceProvider>> = (0..config.simulated_sources)
            .map(|i| {
                let quality = 0.9 - 0.15 * (i % 4) as f64;
                Arc::new(SimulatedProvider::new(format!("directory_{}", i + 1), as_of).with_data_quality(quality))
                    as Arc<dyn DataSourceProvider>
            })
            .collect();
        let aggregator = MultiSourceAggregator::new(providers).with_timeout(config.source_timeout());
        Self::new(
            Arc::new(aggregator),
            Arc::new(CategoryPriorTable::builtin()),
            config.monte_carlo(),
        )
    }

    pub fn priors(&self) -> &CategoryPriorTable {
        &self.priors
    }

    pub fn valuation_service(&self) -> &ValuationService {
        &self.valuation
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn analyze_fragmentation(
        &self,
        zip: &str,
        industry: &str,
        options: &AnalysisOptions,
    ) -> MarketResult<FragmentationAnalysis> {
        let zip = zip.trim();
        let industry = industry.trim();
        if zip.is_empty() {
            return Err(MarketError::MissingInput("zip".to_string()));
        }
        if industry.is_empty() {
            return Err(MarketError::MissingInput("industry".to_string()));
        }
        info!("Starting fragmentation analysis for {}/{}", zip, industry);

        let fetched = self
            .provider
            .fetch_businesses(zip, industry, options.max_businesses)
            .await?;
        let fetched_count = fetched.len();

        let mut businesses = Vec::with_capacity(fetched_count);
        for business in fetched {
            match business.validate() {
                Ok(()) => businesses.push(business),
                Err(e) => warn!(business = %business.id, error = %e, "Dropping invalid observation"),
            }
        }
        let rejected_records = fetched_count - businesses.len();

        if businesses.is_empty() {
            return Err(MarketError::InsufficientData {
                zip: zip.to_string(),
                industry: industry.to_string(),
                reason: if fetched_count == 0 {
                    "no businesses found".to_string()
                } else {
                    format!("all {fetched_count} observations failed validation")
                },
            });
        }

        let (chaos, temporal_pattern) = if options.include_nlp_analysis {
            let analyzer = ReviewChaosAnalyzer::new();
            businesses = businesses
                .into_iter()
                .map(|b| {
                    let scored = analyzer.score_reviews(&b.reviews);
                    b.with_reviews(scored)
                })
                .collect();
            let all_reviews: Vec<Review> = businesses.iter().flat_map(|b| b.reviews.iter().cloned()).collect();
            (
                Some(analyzer.analyze_market(&businesses)),
                Some(analyzer.analyze_temporal(&all_reviews)),
            )
        } else {
            (None, None)
        };

        let metrics = calculate_market_metrics(zip, industry, &businesses, &options.mom_pop_policy)?;
        let entropy = options
            .include_entropy
            .then(|| EntropyCalculator::new(industry).calculate(&businesses));

        let hhi_normalized = metrics.hhi / 10_000.0;
        let consolidation_score = chaos_adjusted_score(
            hhi_normalized,
            metrics.mom_pop_density,
            entropy.map(|e| e.market_entropy),
            chaos.as_ref().map(|c| c.chaotic_actor_ratio),
            industry,
        );

        let competitor_density = entropy
            .map(|e| e.competitive_intensity)
            .unwrap_or_else(|| clamp_unit(businesses.len() as f64 / DENSITY_SATURATION));
        let scorer = ConsolidationScorer::new(ScoringOptions {
            top_n: options.top_targets,
            include_operational: true,
            competitor_density,
        });
        let targets = scorer.rank(&businesses, chaos.as_ref());

        let prior = self.priors.get(industry);
        let projections = project_portfolio(&targets, prior.operating_margin);
        let data_quality = data_quality_score(&businesses);

        debug!(
            "Market {}/{}: consolidation base={:.2} adjusted={:.2} targets={} data_quality={:.2}",
            zip,
            industry,
            consolidation_score.base,
            consolidation_score.adjusted,
            targets.len(),
            data_quality
        );

        let recommendations = recommendations::build(&RecommendationInputs {
            metrics: &metrics,
            consolidation: &consolidation_score,
            entropy: entropy.as_ref(),
            chaos: chaos.as_ref(),
            temporal: temporal_pattern.as_ref(),
            targets: &targets,
            projections: &projections,
            data_quality,
        });

        let sources: Vec<String> = businesses
            .iter()
            .map(|b| b.source.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        info!(
            zip,
            industry,
            businesses = metrics.total_businesses,
            rejected = rejected_records,
            hhi = metrics.hhi,
            level = metrics.concentration_level.to_label(),
            "Fragmentation analysis complete"
        );

        Ok(FragmentationAnalysis {
            analysis_id: Uuid::new_v4().to_string(),
            zip_code: zip.to_string(),
            industry: industry.to_string(),
            analyzed_at: metrics.computed_at,
            hhi: metrics.hhi,
            hhi_normalized,
            concentration_level: metrics.concentration_level,
            mom_pop_density: metrics.mom_pop_density,
            metrics,
            consolidation_score,
            entropy,
            chaos,
            temporal_pattern,
            targets,
            projections,
            data_quality_score: data_quality,
            rejected_records,
            sources,
            recommendations,
        })
    }

    /// Valuation bundle for one business; `seed` overrides the configured seed.
    pub fn valuate_business(&self, signals: &BusinessSignals, seed: Option<u64>) -> MarketResult<BusinessValuation> {
        self.valuation.valuate(signals, seed)
    }
}
