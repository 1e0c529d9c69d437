//! Per-industry economic assumptions used by the valuation ensemble.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{MarketError, MarketResult};

pub const DEFAULT_PRIOR_KEY: &str = "default";

/// Beta distribution parameters for the review-to-customer propensity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaParams {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaParams {
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }
}

/// Mean and standard deviation of a log-normally distributed quantity,
/// expressed in the quantity's own units (not the underlying normal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogNormalParams {
    pub mean: f64,
    pub std: f64,
}

impl LogNormalParams {
    /// (mu, sigma) of the underlying normal distribution
    pub fn underlying(&self) -> (f64, f64) {
        let mean = self.mean.max(f64::EPSILON);
        let variance_ratio = (self.std / mean).powi(2);
        let sigma_sq = (1.0 + variance_ratio).ln();
        let mu = mean.ln() - sigma_sq / 2.0;
        (mu, sigma_sq.sqrt())
    }
}

/// One entry of the discrete price mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobType {
    pub name: String,
    pub price: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FunnelRates {
    pub click_through: f64,
    pub conversion: f64,
    pub booking: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrior {
    pub key: String,
    pub review_propensity: BetaParams,
    pub price_mix: Vec<JobType>,
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub repeat_factor: f64,
    pub multiple: LogNormalParams,
    pub funnel: FunnelRates,
    /// Baseline monthly visits at a popularity index of 50
    pub base_monthly_visits: f64,
    /// Annual household spend on the category, national average
    pub annual_household_spend: f64,
    /// Expected annual market growth rate
    pub growth_rate: f64,
}

impl CategoryPrior {
    /// Weighted mean job price
    pub fn mean_price(&self) -> f64 {
        self.price_mix.iter().map(|j| j.price * j.weight).sum()
    }

    pub fn validate(&self) -> MarketResult<()> {
        if self.price_mix.is_empty() {
            return Err(MarketError::InvalidData(format!(
                "prior '{}' has an empty price mix",
                self.key
            )));
        }
        let weight_sum: f64 = self.price_mix.iter().map(|j| j.weight).sum();
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(MarketError::InvalidData(format!(
                "prior '{}' price-mix weights sum to {weight_sum}, expected 1",
                self.key
            )));
        }
        if self.price_mix.iter().any(|j| j.weight < 0.0 || j.price < 0.0) {
            return Err(MarketError::InvalidData(format!(
                "prior '{}' has a negative price or weight",
                self.key
            )));
        }
        if self.review_propensity.alpha <= 0.0 || self.review_propensity.beta <= 0.0 {
            return Err(MarketError::InvalidData(format!(
                "prior '{}' propensity Beta parameters must be positive",
                self.key
            )));
        }
        if self.multiple.mean <= 0.0 || self.multiple.std < 0.0 {
            return Err(MarketError::InvalidData(format!(
                "prior '{}' multiple distribution is invalid",
                self.key
            )));
        }
        for (name, v) in [
            ("gross_margin", self.gross_margin),
            ("operating_margin", self.operating_margin),
            ("click_through", self.funnel.click_through),
            ("conversion", self.funnel.conversion),
            ("booking", self.funnel.booking),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(MarketError::InvalidData(format!(
                    "prior '{}' {name} = {v} outside [0, 1]",
                    self.key
                )));
            }
        }
        Ok(())
    }
}

/// Read-only lookup of category priors, keyed by lowercase industry name.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPriorTable {
    priors: BTreeMap<String, CategoryPrior>,
}

impl Default for CategoryPriorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryPriorTable {
    /// Table containing only the default prior
    pub fn empty() -> Self {
        let mut priors = BTreeMap::new();
        priors.insert(DEFAULT_PRIOR_KEY.to_string(), default_prior());
        Self { priors }
    }

    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for prior in builtin_priors() {
            table.priors.insert(prior.key.clone(), prior);
        }
        table
    }

    /// Add or replace a prior after validating it
    pub fn insert(&mut self, prior: CategoryPrior) -> MarketResult<()> {
        prior.validate()?;
        let key = normalize_key(&prior.key);
        self.priors.insert(key.clone(), CategoryPrior { key, ..prior });
        Ok(())
    }

    /// Case-insensitive lookup that falls back to the default prior
    pub fn get(&self, industry: &str) -> &CategoryPrior {
        self.lookup(industry).unwrap_or_else(|| self.default_prior())
    }

    /// Exact (case-insensitive) lookup without fallback
    pub fn lookup(&self, industry: &str) -> Option<&CategoryPrior> {
        self.priors.get(&normalize_key(industry))
    }

    pub fn default_prior(&self) -> &CategoryPrior {
        // `empty()` always seeds the default entry and `insert` can only replace it.
        &self.priors[DEFAULT_PRIOR_KEY]
    }

    pub fn contains(&self, industry: &str) -> bool {
        self.lookup(industry).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.priors.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryPrior> {
        self.priors.values()
    }
}

fn normalize_key(industry: &str) -> String {
    industry
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

fn jobs(items: &[(&str, f64, f64)]) -> Vec<JobType> {
    items
        .iter()
        .map(|(name, price, weight)| JobType {
            name: name.to_string(),
            price: *price,
            weight: *weight,
        })
        .collect()
}

fn default_prior() -> CategoryPrior {
    CategoryPrior {
        key: DEFAULT_PRIOR_KEY.to_string(),
        review_propensity: BetaParams { alpha: 2.0, beta: 48.0 },
        price_mix: jobs(&[("standard", 250.0, 0.6), ("premium", 600.0, 0.3), ("major", 1500.0, 0.1)]),
        gross_margin: 0.45,
        operating_margin: 0.15,
        repeat_factor: 1.5,
        multiple: LogNormalParams { mean: 3.0, std: 0.75 },
        funnel: FunnelRates {
            click_through: 0.04,
            conversion: 0.10,
            booking: 0.50,
        },
        base_monthly_visits: 400.0,
        annual_household_spend: 600.0,
        growth_rate: 0.04,
    }
}

#[allow(clippy::too_many_arguments)]
fn prior(
    key: &str,
    propensity: (f64, f64),
    price_mix: &[(&str, f64, f64)],
    gross_margin: f64,
    operating_margin: f64,
    repeat_factor: f64,
    multiple: (f64, f64),
    funnel: (f64, f64, f64),
    base_monthly_visits: f64,
    annual_household_spend: f64,
    growth_rate: f64,
) -> CategoryPrior {
    CategoryPrior {
        key: key.to_string(),
        review_propensity: BetaParams {
            alpha: propensity.0,
            beta: propensity.1,
        },
        price_mix: jobs(price_mix),
        gross_margin,
        operating_margin,
        repeat_factor,
        multiple: LogNormalParams {
            mean: multiple.0,
            std: multiple.1,
        },
        funnel: FunnelRates {
            click_through: funnel.0,
            conversion: funnel.1,
            booking: funnel.2,
        },
        base_monthly_visits,
        annual_household_spend,
        growth_rate,
    }
}

fn builtin_priors() -> Vec<CategoryPrior> {
    vec![
        prior(
            "hvac",
            (2.0, 38.0),
            &[("tune_up", 150.0, 0.45), ("repair", 450.0, 0.35), ("replacement", 7500.0, 0.20)],
            0.50, 0.18, 1.8, (3.5, 0.8), (0.05, 0.12, 0.55), 120.0, 520.0, 0.05,
        ),
        prior(
            "plumbing",
            (2.0, 40.0),
            &[("drain", 225.0, 0.45), ("repair", 400.0, 0.35), ("repipe", 4500.0, 0.20)],
            0.50, 0.17, 1.6, (3.2, 0.7), (0.05, 0.12, 0.55), 110.0, 450.0, 0.04,
        ),
        prior(
            "electrical",
            (2.0, 42.0),
            &[("service_call", 200.0, 0.50), ("install", 900.0, 0.35), ("panel", 3000.0, 0.15)],
            0.48, 0.16, 1.5, (3.1, 0.7), (0.045, 0.11, 0.55), 90.0, 380.0, 0.05,
        ),
        prior(
            "roofing",
            (2.5, 30.0),
            &[("repair", 850.0, 0.55), ("partial", 4000.0, 0.25), ("full_roof", 12000.0, 0.20)],
            0.40, 0.14, 1.1, (2.8, 0.6), (0.04, 0.08, 0.45), 60.0, 420.0, 0.04,
        ),
        prior(
            "landscaping",
            (1.5, 45.0),
            &[("maintenance", 120.0, 0.60), ("cleanup", 450.0, 0.25), ("install", 3500.0, 0.15)],
            0.42, 0.13, 3.0, (2.6, 0.6), (0.04, 0.10, 0.50), 150.0, 560.0, 0.04,
        ),
        prior(
            "cleaning",
            (1.5, 50.0),
            &[("standard", 140.0, 0.65), ("deep", 300.0, 0.25), ("move_out", 450.0, 0.10)],
            0.45, 0.12, 4.0, (2.4, 0.5), (0.045, 0.12, 0.55), 200.0, 480.0, 0.05,
        ),
        prior(
            "auto_repair",
            (2.0, 45.0),
            &[("oil_change", 70.0, 0.40), ("brakes", 400.0, 0.35), ("major_repair", 1800.0, 0.25)],
            0.50, 0.14, 2.5, (3.0, 0.7), (0.05, 0.10, 0.50), 450.0, 1200.0, 0.03,
        ),
        prior(
            "restaurant",
            (1.0, 99.0),
            &[("lunch", 18.0, 0.45), ("dinner", 42.0, 0.45), ("catering", 650.0, 0.10)],
            0.62, 0.08, 6.0, (2.2, 0.6), (0.03, 0.15, 0.80), 2500.0, 3500.0, 0.03,
        ),
        prior(
            "salon",
            (1.5, 60.0),
            &[("cut", 55.0, 0.55), ("color", 150.0, 0.35), ("treatment", 250.0, 0.10)],
            0.55, 0.12, 6.0, (2.3, 0.5), (0.05, 0.12, 0.60), 500.0, 900.0, 0.04,
        ),
        prior(
            "fitness",
            (1.0, 80.0),
            &[("membership", 60.0, 0.70), ("class_pack", 150.0, 0.20), ("personal_training", 600.0, 0.10)],
            0.60, 0.15, 10.0, (2.8, 0.7), (0.04, 0.08, 0.60), 1500.0, 700.0, 0.05,
        ),
        prior(
            "dental",
            (2.0, 60.0),
            &[("cleaning", 180.0, 0.55), ("filling", 350.0, 0.30), ("crown", 1400.0, 0.15)],
            0.60, 0.22, 3.0, (4.0, 0.9), (0.04, 0.10, 0.60), 350.0, 800.0, 0.04,
        ),
        prior(
            "legal",
            (1.5, 60.0),
            &[("consult", 350.0, 0.50), ("document", 1500.0, 0.35), ("litigation", 12000.0, 0.15)],
            0.65, 0.25, 1.3, (3.5, 1.0), (0.03, 0.06, 0.40), 80.0, 600.0, 0.03,
        ),
        prior(
            "accounting",
            (1.0, 70.0),
            &[("tax_return", 400.0, 0.60), ("bookkeeping", 1800.0, 0.30), ("advisory", 5000.0, 0.10)],
            0.60, 0.24, 4.0, (3.8, 0.9), (0.03, 0.08, 0.50), 70.0, 550.0, 0.03,
        ),
    ]
}
