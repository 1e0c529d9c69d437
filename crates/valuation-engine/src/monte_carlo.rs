use market_analysis::quick_operational_multiplier;
use market_core::{BusinessSignals, CategoryPrior, LogNormalParams, MarketError, MarketResult};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use statrs::distribution::{Beta, LogNormal};
use tracing::debug;

use crate::estimators::{ads_funnel_revenue, ensemble_weights, foot_traffic_revenue, review_driven_revenue};
use crate::geography::geography_multiplier;
use crate::models::{DistributionSummary, EnsembleWeights, EstimatorMeans, MonteCarloConfig, ValuationResult};

/// Multiplicative noise on the sampled job price
const PRICE_NOISE: LogNormalParams = LogNormalParams { mean: 1.0, std: 0.2 };

/// Log-normal draw that degenerates to a constant when the spread is zero.
enum LogNormalSampler {
    Fixed(f64),
    Sampled(LogNormal),
}

impl LogNormalSampler {
    fn new(params: &LogNormalParams, what: &str) -> MarketResult<Self> {
        if params.std <= 0.0 {
            return Ok(LogNormalSampler::Fixed(params.mean));
        }
        let (mu, sigma) = params.underlying();
        LogNormal::new(mu, sigma)
            .map(LogNormalSampler::Sampled)
            .map_err(|e| MarketError::InvalidData(format!("{what} distribution: {e}")))
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            LogNormalSampler::Fixed(v) => *v,
            LogNormalSampler::Sampled(d) => d.sample(rng),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Draw {
    review: f64,
    ads: f64,
    foot_traffic: f64,
    revenue: f64,
    ebitda: f64,
    valuation: f64,
}

/// Everything a single draw needs, built once per valuation.
struct DrawSampler<'a> {
    signals: &'a BusinessSignals,
    prior: &'a CategoryPrior,
    propensity: Beta,
    job_index: WeightedIndex<f64>,
    price_noise: LogNormalSampler,
    multiple: LogNormalSampler,
    weights: EnsembleWeights,
    geography: f64,
    operational: f64,
}

impl<'a> DrawSampler<'a> {
    fn new(signals: &'a BusinessSignals, prior: &'a CategoryPrior) -> MarketResult<Self> {
        let propensity = Beta::new(prior.review_propensity.alpha, prior.review_propensity.beta)
            .map_err(|e| MarketError::InvalidData(format!("propensity distribution: {e}")))?;
        let job_index = WeightedIndex::new(prior.price_mix.iter().map(|j| j.weight))
            .map_err(|e| MarketError::InvalidData(format!("price mix for '{}': {e}", prior.key)))?;

        Ok(Self {
            signals,
            prior,
            propensity,
            job_index,
            price_noise: LogNormalSampler::new(&PRICE_NOISE, "price noise")?,
            multiple: LogNormalSampler::new(&prior.multiple, "valuation multiple")?,
            weights: ensemble_weights(signals),
            geography: geography_multiplier(signals.median_income),
            operational: quick_operational_multiplier(&signals.operational),
        })
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Draw {
        let propensity = self.propensity.sample(rng);
        let job = &self.prior.price_mix[self.job_index.sample(rng)];
        let price = job.price * self.price_noise.sample(rng) * self.geography;
        let multiple = self.multiple.sample(rng);

        let review = review_driven_revenue(
            self.signals.operational.reviews_last_12m,
            propensity,
            self.prior.repeat_factor,
            price,
        );
        let ads = ads_funnel_revenue(&self.signals.ads, &self.prior.funnel, price);
        let foot_traffic = foot_traffic_revenue(self.signals.popularity_index, self.prior, price);

        let revenue = self.weights.blend(review, ads, foot_traffic);
        let ebitda = revenue * self.prior.operating_margin * self.operational;
        Draw {
            review,
            ads,
            foot_traffic,
            revenue,
            ebitda,
            valuation: ebitda * multiple,
        }
    }

    fn summarize(&self, draws: &[Draw], seed: Option<u64>) -> ValuationResult {
        let column = |f: fn(&Draw) -> f64| draws.iter().map(f).collect::<Vec<f64>>();
        let revenue = column(|d| d.revenue);
        let ebitda = column(|d| d.ebitda);
        let valuation = column(|d| d.valuation);
        let n = draws.len().max(1) as f64;

        ValuationResult {
            revenue: DistributionSummary::from_samples(&revenue),
            ebitda: DistributionSummary::from_samples(&ebitda),
            valuation: DistributionSummary::from_samples(&valuation),
            weights: self.weights,
            runs: draws.len(),
            seed,
            geography_multiplier: self.geography,
            operational_multiplier: self.operational,
            estimator_means: EstimatorMeans {
                review: draws.iter().map(|d| d.review).sum::<f64>() / n,
                ads: draws.iter().map(|d| d.ads).sum::<f64>() / n,
                foot_traffic: draws.iter().map(|d| d.foot_traffic).sum::<f64>() / n,
            },
        }
    }
}

fn check_runs(runs: usize) -> MarketResult<()> {
    if runs == 0 {
        return Err(MarketError::InvalidData("Monte Carlo runs must be at least 1".to_string()));
    }
    Ok(())
}

/// Parallel seeded valuation.
///
/// Draw `i` runs on its own ChaCha8 stream `i` of the configured seed, so the
/// output does not depend on how rayon schedules the draws.
pub fn run(signals: &BusinessSignals, prior: &CategoryPrior, config: &MonteCarloConfig) -> MarketResult<ValuationResult> {
    check_runs(config.runs)?;
    let sampler = DrawSampler::new(signals, prior)?;

    let draws: Vec<Draw> = (0..config.runs)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            rng.set_stream(i as u64);
            sampler.draw(&mut rng)
        })
        .collect();

    let result = sampler.summarize(&draws, Some(config.seed));
    debug!(
        business = %signals.business_name,
        runs = config.runs,
        seed = config.seed,
        p50_valuation = result.valuation.p50,
        "Monte Carlo valuation complete"
    );
    Ok(result)
}

/// Sequential valuation drawing from a caller-supplied RNG.
pub fn run_with_rng<R: Rng + ?Sized>(
    signals: &BusinessSignals,
    prior: &CategoryPrior,
    runs: usize,
    rng: &mut R,
) -> MarketResult<ValuationResult> {
    check_runs(runs)?;
    let sampler = DrawSampler::new(signals, prior)?;
    let draws: Vec<Draw> = (0..runs).map(|_| sampler.draw(&mut *rng)).collect();
    Ok(sampler.summarize(&draws, None))
}
