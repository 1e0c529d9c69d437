//! Paid-search budget plan from keyword observations and unit economics.

use market_core::{AdsObservation, CategoryPrior};
use serde::{Deserialize, Serialize};

use crate::estimators::effective_ctr;

const FULL_FUNDING_RATIO: f64 = 3.0;
const HALF_FUNDING_RATIO: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Funding {
    Full,
    Half,
    Unfunded,
}

impl Funding {
    fn from_ratio(ltv_to_cac: f64) -> Self {
        if ltv_to_cac >= FULL_FUNDING_RATIO {
            Funding::Full
        } else if ltv_to_cac >= HALF_FUNDING_RATIO {
            Funding::Half
        } else {
            Funding::Unfunded
        }
    }

    pub fn fraction(&self) -> f64 {
        match self {
            Funding::Full => 1.0,
            Funding::Half => 0.5,
            Funding::Unfunded => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordPlan {
    pub index: usize,
    pub effective_ctr: f64,
    pub monthly_clicks: f64,
    /// Cost to acquire one booked customer through this keyword
    pub cac: f64,
    pub ltv_to_cac: f64,
    pub funding: Funding,
    pub monthly_budget: f64,
    pub expected_customers: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSpendPlan {
    pub ltv: f64,
    pub keywords: Vec<KeywordPlan>,
    pub total_monthly_budget: f64,
    pub expected_monthly_customers: f64,
    /// None when nothing is funded
    pub blended_cac: Option<f64>,
    pub expected_monthly_revenue: f64,
}

/// Fund each keyword according to its LTV:CAC ratio.
pub fn plan_ad_spend(prior: &CategoryPrior, ads: &[AdsObservation], geography: f64) -> AdSpendPlan {
    let ticket = prior.mean_price() * geography;
    let ltv = ticket * prior.gross_margin * prior.repeat_factor;
    let close_rate = prior.funnel.conversion * prior.funnel.booking;

    let keywords: Vec<KeywordPlan> = ads
        .iter()
        .enumerate()
        .map(|(index, ad)| {
            let ctr = effective_ctr(prior.funnel.click_through, ad.competition);
            let clicks = ad.monthly_volume.max(0.0) * ctr;
            let cac = if close_rate > 0.0 { ad.cpc / close_rate } else { f64::INFINITY };
            let ltv_to_cac = if cac > 0.0 { ltv / cac } else { f64::INFINITY };
            let funding = if cac.is_finite() { Funding::from_ratio(ltv_to_cac) } else { Funding::Unfunded };
            let funded_clicks = clicks * funding.fraction();
            KeywordPlan {
                index,
                effective_ctr: ctr,
                monthly_clicks: clicks,
                cac,
                ltv_to_cac,
                funding,
                monthly_budget: funded_clicks * ad.cpc,
                expected_customers: funded_clicks * close_rate,
            }
        })
        .collect();

    let total_monthly_budget: f64 = keywords.iter().map(|k| k.monthly_budget).sum();
    let expected_monthly_customers: f64 = keywords.iter().map(|k| k.expected_customers).sum();
    let blended_cac = (expected_monthly_customers > 0.0).then(|| total_monthly_budget / expected_monthly_customers);

    AdSpendPlan {
        ltv,
        keywords,
        total_monthly_budget,
        expected_monthly_customers,
        blended_cac,
        expected_monthly_revenue: expected_monthly_customers * ticket,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use market_core::{CategoryPriorTable, FunnelRates, JobType};

    fn prior() -> CategoryPrior {
        let mut p = CategoryPriorTable::builtin().get("hvac").clone();
        p.price_mix = vec![JobType {
            name: "job".to_string(),
            price: 1000.0,
            weight: 1.0,
        }];
        p.gross_margin = 0.5;
        p.repeat_factor = 2.0;
        p.funnel = FunnelRates {
            click_through: 0.1,
            conversion: 0.2,
            booking: 0.5,
        };
        p
    }

    fn ad(cpc: f64) -> AdsObservation {
        AdsObservation {
            monthly_volume: 1000.0,
            cpc,
            competition: 0.0,
        }
    }

    #[test]
    fn funding_tiers_follow_ltv_to_cac() {
        // LTV = 1000 * 0.5 * 2 = 1000; close rate 0.1 so CAC = cpc * 10
        let plan = plan_ad_spend(&prior(), &[ad(10.0), ad(50.0), ad(100.0)], 1.0);
        assert_relative_eq!(plan.ltv, 1000.0);
        assert_eq!(plan.keywords[0].funding, Funding::Full);
        assert_eq!(plan.keywords[1].funding, Funding::Half);
        assert_eq!(plan.keywords[2].funding, Funding::Unfunded);

        // 100 clicks each; full: 100 * 10, half: 50 * 50
        assert_relative_eq!(plan.total_monthly_budget, 1000.0 + 2500.0, epsilon = 1e-9);
        assert_relative_eq!(plan.expected_monthly_customers, 10.0 + 5.0, epsilon = 1e-9);
        assert_relative_eq!(plan.blended_cac.unwrap(), 3500.0 / 15.0, epsilon = 1e-9);
        assert_relative_eq!(plan.expected_monthly_revenue, 15_000.0, epsilon = 1e-6);
    }

    #[test]
    fn nothing_funded_without_ads() {
        let plan = plan_ad_spend(&prior(), &[], 1.0);
        assert_eq!(plan.total_monthly_budget, 0.0);
        assert!(plan.blended_cac.is_none());
    }
}
