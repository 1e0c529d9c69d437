use std::sync::Arc;

use market_analysis::{assess, assess_transition_risk, AoaResult, TransitionRisk};
use market_core::{BusinessSignals, CategoryPriorTable, MarketResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ad_spend::{plan_ad_spend, AdSpendPlan};
use crate::geography::geography_multiplier;
use crate::market_potential::{assess_market_potential, MarketPotential};
use crate::models::{MonteCarloConfig, ValuationResult};
use crate::monte_carlo;

/// Valuation, operational health, market potential, and ad plan for one business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessValuation {
    pub business_name: String,
    pub industry: String,
    /// Prior actually used after default fallback
    pub prior_key: String,
    pub valuation: ValuationResult,
    pub operational: AoaResult,
    pub transition_risk: TransitionRisk,
    pub market_potential: Option<MarketPotential>,
    pub ad_spend: Option<AdSpendPlan>,
}

/// Stateless valuation front end over a shared prior table.
#[derive(Clone)]
pub struct ValuationService {
    priors: Arc<CategoryPriorTable>,
    config: MonteCarloConfig,
}

impl ValuationService {
    pub fn new(priors: Arc<CategoryPriorTable>, config: MonteCarloConfig) -> Self {
        Self { priors, config }
    }

    pub fn priors(&self) -> &CategoryPriorTable {
        &self.priors
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Value one business. `seed` overrides the configured seed.
    pub fn valuate(&self, signals: &BusinessSignals, seed: Option<u64>) -> MarketResult<BusinessValuation> {
        signals.validate()?;
        let prior = self.priors.get(&signals.industry);
        let config = MonteCarloConfig {
            seed: seed.unwrap_or(self.config.seed),
            ..self.config
        };

        let valuation = monte_carlo::run(signals, prior, &config)?;
        let operational = assess(&signals.operational);
        let transition_risk = assess_transition_risk(&signals.operational);

        let market_potential = match signals.population {
            Some(population) if population > 0 => Some(assess_market_potential(
                prior,
                population,
                signals.median_income,
                valuation.revenue.p50,
                None,
            )?),
            _ => None,
        };
        let ad_spend = (!signals.ads.is_empty())
            .then(|| plan_ad_spend(prior, &signals.ads, geography_multiplier(signals.median_income)));

        info!(
            business = %signals.business_name,
            industry = %prior.key,
            p50_valuation = valuation.valuation.p50,
            grade = %operational.grade,
            "Business valuated"
        );

        Ok(BusinessValuation {
            business_name: signals.business_name.clone(),
            industry: signals.industry.clone(),
            prior_key: prior.key.clone(),
            valuation,
            operational,
            transition_risk,
            market_potential,
            ad_spend,
        })
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new(Arc::new(CategoryPriorTable::builtin()), MonteCarloConfig::default())
    }
}
