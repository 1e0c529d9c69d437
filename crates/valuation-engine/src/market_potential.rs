//! Total Market Potential (TMP): addressable spend, penetration, headroom.

use market_core::stats::clamp_unit;
use market_core::{CategoryPrior, MarketError, MarketResult};
use serde::{Deserialize, Serialize};

use crate::geography::geography_multiplier;

pub const PERSONS_PER_HOUSEHOLD: f64 = 2.5;
/// Share of headroom a focused operator can plausibly win in a year
pub const SHARE_CAPTURE_RATE: f64 = 0.10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketPotential {
    pub households: f64,
    pub total_addressable_market: f64,
    pub captured_revenue: f64,
    pub penetration: f64,
    pub headroom: f64,
    /// Twelve-month growth from the market itself expanding
    pub market_growth: f64,
    /// Twelve-month growth available from taking share
    pub share_capture_opportunity: f64,
    pub revenue_per_business: Option<f64>,
    pub geography_multiplier: f64,
}

pub fn assess_market_potential(
    prior: &CategoryPrior,
    population: u64,
    median_income: Option<f64>,
    observed_revenue: f64,
    business_count: Option<usize>,
) -> MarketResult<MarketPotential> {
    if population == 0 {
        return Err(MarketError::InvalidData("population must be positive".to_string()));
    }
    if observed_revenue < 0.0 {
        return Err(MarketError::InvalidData("observed revenue must be non-negative".to_string()));
    }

    let geography = geography_multiplier(median_income);
    let households = population as f64 / PERSONS_PER_HOUSEHOLD;
    let tam = households * prior.annual_household_spend * geography;
    let penetration = if tam > 0.0 { clamp_unit(observed_revenue / tam) } else { 0.0 };
    let headroom = (tam - observed_revenue).max(0.0);

    Ok(MarketPotential {
        households,
        total_addressable_market: tam,
        captured_revenue: observed_revenue,
        penetration,
        headroom,
        market_growth: tam * prior.growth_rate,
        share_capture_opportunity: headroom * SHARE_CAPTURE_RATE,
        revenue_per_business: business_count.filter(|n| *n > 0).map(|n| observed_revenue / n as f64),
        geography_multiplier: geography,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use market_core::CategoryPriorTable;

    #[test]
    fn tam_from_households() {
        let table = CategoryPriorTable::builtin();
        let prior = table.get("hvac");
        let tmp = assess_market_potential(prior, 25_000, None, 1_000_000.0, Some(4)).unwrap();
        assert_relative_eq!(tmp.households, 10_000.0);
        assert_relative_eq!(tmp.total_addressable_market, 10_000.0 * prior.annual_household_spend);
        assert_relative_eq!(tmp.penetration, 1_000_000.0 / tmp.total_addressable_market);
        assert_relative_eq!(tmp.headroom, tmp.total_addressable_market - 1_000_000.0);
        assert_relative_eq!(tmp.share_capture_opportunity, tmp.headroom * 0.1);
        assert_relative_eq!(tmp.revenue_per_business.unwrap(), 250_000.0);
    }

    #[test]
    fn saturated_market_has_no_headroom() {
        let table = CategoryPriorTable::builtin();
        let tmp = assess_market_potential(table.get("hvac"), 100, None, 1e9, None).unwrap();
        assert_eq!(tmp.headroom, 0.0);
        assert_eq!(tmp.penetration, 1.0);
        assert!(tmp.revenue_per_business.is_none());
    }

    #[test]
    fn zero_population_rejected() {
        let table = CategoryPriorTable::builtin();
        assert!(assess_market_potential(table.get("hvac"), 0, None, 0.0, None).is_err());
    }
}
