//! Market Entropy / Chaos Metrics
//!
//! Six independent measures of how unpredictable a local market is. Every
//! output is bounded to [0, 1] and degrades to 0 for markets with fewer than
//! two businesses.

use market_core::stats::{clamp_unit, coefficient_of_variation, mean, population_variance};
use market_core::BusinessObservation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Entropy reported when total revenue is zero and shares are undefined
const NEUTRAL_ENTROPY: f64 = 0.5;
/// Maximum population variance of a rating on a 1-5 scale
const MAX_RATING_VARIANCE: f64 = 4.0;
const DISPERSION_SCALE: f64 = 1.5;
const YOUNG_BUSINESS_YEARS: f64 = 3.0;
const DENSITY_REFERENCE_COUNT: f64 = 50.0;
const HIGH_RATING: f64 = 4.5;
const SMALL_BUSINESS_EMPLOYEES: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntropyMetrics {
    pub market_entropy: f64,
    pub pricing_volatility: f64,
    pub quality_variance: f64,
    pub geographic_dispersion: f64,
    pub temporal_instability: f64,
    pub competitive_intensity: f64,
}

impl EntropyMetrics {
    /// Weighted single-number summary of the six measures
    pub fn chaos_index(&self) -> f64 {
        clamp_unit(
            self.market_entropy * 0.25
                + self.pricing_volatility * 0.15
                + self.quality_variance * 0.15
                + self.geographic_dispersion * 0.10
                + self.temporal_instability * 0.15
                + self.competitive_intensity * 0.20,
        )
    }
}

/// Industry-specific multiplier on competitive intensity.
pub fn industry_competitiveness(industry: &str) -> f64 {
    let industry = industry.to_lowercase();
    let table: [(&[&str], f64); 8] = [
        (&["restaurant", "food", "cafe"][..], 1.3),
        (&["bar", "nightlife", "pub"][..], 1.25),
        (&["retail", "store", "shop"][..], 1.1),
        (&["salon", "beauty", "barber", "spa"][..], 1.1),
        (&["fitness", "gym"][..], 1.05),
        (&["legal", "law", "attorney"][..], 0.8),
        (&["accounting", "cpa", "tax"][..], 0.8),
        (&["dental", "medical", "clinic", "health"][..], 0.85),
    ];
    let tokens: Vec<&str> = industry
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.strip_suffix('s').filter(|s| s.len() > 2).unwrap_or(t))
        .collect();
    for (keywords, coefficient) in table {
        if tokens.iter().any(|t| keywords.contains(t)) {
            return coefficient;
        }
    }
    1.0
}

pub struct EntropyCalculator {
    competitiveness: f64,
}

impl EntropyCalculator {
    pub fn new(industry: &str) -> Self {
        Self {
            competitiveness: industry_competitiveness(industry),
        }
    }

    /// Calculator with an explicit competitiveness coefficient
    pub fn with_competitiveness(competitiveness: f64) -> Self {
        Self { competitiveness }
    }

    pub fn calculate(&self, businesses: &[BusinessObservation]) -> EntropyMetrics {
        EntropyMetrics {
            market_entropy: market_entropy(businesses),
            pricing_volatility: pricing_volatility(businesses),
            quality_variance: quality_variance(businesses),
            geographic_dispersion: geographic_dispersion(businesses),
            temporal_instability: temporal_instability(businesses),
            competitive_intensity: competitive_intensity(businesses, self.competitiveness),
        }
    }
}

/// Shannon entropy of revenue shares normalized by log2(n).
/// 0 means one business owns the market, 1 an even split.
pub fn market_entropy(businesses: &[BusinessObservation]) -> f64 {
    let n = businesses.len();
    if n < 2 {
        return 0.0;
    }
    let total: f64 = businesses.iter().map(|b| b.revenue_for_share()).sum();
    if total <= 0.0 {
        return NEUTRAL_ENTROPY;
    }
    let h: f64 = businesses
        .iter()
        .map(|b| b.revenue_for_share() / total)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.log2())
        .sum();
    clamp_unit(h / (n as f64).log2())
}

/// Coefficient of variation of revenue estimates, capped at 1.
pub fn pricing_volatility(businesses: &[BusinessObservation]) -> f64 {
    let revenues: Vec<f64> = businesses.iter().filter_map(|b| b.estimated_revenue).collect();
    if revenues.len() < 2 {
        return 0.0;
    }
    clamp_unit(coefficient_of_variation(&revenues))
}

/// Rating variance normalized by the maximum variance on a 5-point scale.
pub fn quality_variance(businesses: &[BusinessObservation]) -> f64 {
    let ratings: Vec<f64> = businesses.iter().filter_map(|b| b.average_rating).collect();
    if ratings.len() < 2 {
        return 0.0;
    }
    clamp_unit(population_variance(&ratings) / MAX_RATING_VARIANCE)
}

/// Street part of an address: text before the first comma with a leading house number removed.
fn street_name(address: &str) -> Option<String> {
    let first = address.split(',').next()?.trim().to_lowercase();
    let street: Vec<&str> = first
        .split_whitespace()
        .skip_while(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .collect();
    if street.is_empty() {
        None
    } else {
        Some(street.join(" "))
    }
}

/// Distinct streets per business, a stand-in for spatial spread when
/// coordinates are unavailable.
pub fn geographic_dispersion(businesses: &[BusinessObservation]) -> f64 {
    let n = businesses.len();
    if n < 2 {
        return 0.0;
    }
    let streets: HashSet<String> = businesses
        .iter()
        .filter_map(|b| street_name(&b.address))
        .collect();
    clamp_unit(streets.len() as f64 / n as f64 * DISPERSION_SCALE)
}

/// Age spread plus share of very young businesses.
pub fn temporal_instability(businesses: &[BusinessObservation]) -> f64 {
    let ages: Vec<f64> = businesses.iter().filter_map(|b| b.business_age).collect();
    if ages.len() < 2 {
        return 0.0;
    }
    let young = ages.iter().filter(|a| **a < YOUNG_BUSINESS_YEARS).count() as f64 / ages.len() as f64;
    clamp_unit(coefficient_of_variation(&ages) * 0.6 + young * 0.4)
}

pub fn competitive_intensity(businesses: &[BusinessObservation], competitiveness: f64) -> f64 {
    let n = businesses.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let density = (n_f / DENSITY_REFERENCE_COUNT).min(1.0);
    let small = businesses
        .iter()
        .filter(|b| b.employees.is_some_and(|e| e < SMALL_BUSINESS_EMPLOYEES))
        .count() as f64
        / n_f;
    let high_rated = businesses
        .iter()
        .filter(|b| b.average_rating.is_some_and(|r| r >= HIGH_RATING))
        .count() as f64
        / n_f;
    let review_counts: Vec<f64> = businesses
        .iter()
        .filter_map(|b| b.review_count.map(|c| c as f64))
        .collect();
    let activity = (mean(&review_counts) / 100.0).min(1.0);

    let base = density * 0.3 + small * 0.25 + high_rated * 0.2 + activity * 0.25;
    clamp_unit(base * competitiveness.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn biz(id: &str, revenue: f64) -> BusinessObservation {
        BusinessObservation::new(id, id, "94107", "hvac").with_revenue(revenue)
    }

    #[test]
    fn even_split_has_entropy_one() {
        let businesses: Vec<_> = (0..8).map(|i| biz(&i.to_string(), 50_000.0)).collect();
        assert_relative_eq!(market_entropy(&businesses), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn monopoly_has_entropy_zero() {
        let businesses = vec![biz("a", 1_000_000.0), biz("b", 0.0), biz("c", 0.0)];
        assert_relative_eq!(market_entropy(&businesses), 0.0);
    }

    #[test]
    fn zero_revenue_is_neutral() {
        let businesses = vec![
            BusinessObservation::new("a", "a", "1", "x"),
            BusinessObservation::new("b", "b", "1", "x"),
        ];
        assert_eq!(market_entropy(&businesses), NEUTRAL_ENTROPY);
    }

    #[test]
    fn single_and_empty_markets_degrade_to_zero() {
        let calc = EntropyCalculator::new("restaurant");
        assert_eq!(calc.calculate(&[]), EntropyMetrics::default());
        let one = vec![biz("a", 10.0).with_reviews_summary(10, 4.0).with_business_age(2.0)];
        assert_eq!(calc.calculate(&one), EntropyMetrics::default());
    }

    #[test]
    fn pricing_volatility_capped() {
        let businesses = vec![biz("a", 1.0), biz("b", 1.0), biz("c", 1_000_000.0)];
        let v = pricing_volatility(&businesses);
        assert!(v <= 1.0 && v > 0.9);
    }

    #[test]
    fn quality_variance_uses_max_variance() {
        let businesses = vec![
            biz("a", 1.0).with_reviews_summary(5, 1.0),
            biz("b", 1.0).with_reviews_summary(5, 5.0),
        ];
        assert_relative_eq!(quality_variance(&businesses), 1.0);
    }

    #[test]
    fn dispersion_counts_distinct_streets() {
        let businesses = vec![
            biz("a", 1.0).with_address("12 Main St, Springfield"),
            biz("b", 1.0).with_address("99 Main St, Springfield"),
            biz("c", 1.0).with_address("4 Oak Ave, Springfield"),
            biz("d", 1.0).with_address("7 Oak Ave"),
        ];
        assert_relative_eq!(geographic_dispersion(&businesses), 2.0 / 4.0 * 1.5);
    }

    #[test]
    fn temporal_instability_blends_cv_and_young_share() {
        let businesses = vec![
            biz("a", 1.0).with_business_age(1.0),
            biz("b", 1.0).with_business_age(3.0),
        ];
        // mean 2, std 1, cv 0.5; half are younger than three years
        assert_relative_eq!(temporal_instability(&businesses), 0.5 * 0.6 + 0.5 * 0.4);
    }

    #[test]
    fn competitiveness_coefficients() {
        assert_eq!(industry_competitiveness("Restaurants"), 1.3);
        assert_eq!(industry_competitiveness("legal services"), 0.8);
        assert_eq!(industry_competitiveness("hvac"), 1.0);
    }

    #[test]
    fn all_metrics_bounded() {
        let businesses: Vec<_> = (0..60)
            .map(|i| {
                biz(&i.to_string(), (i as f64 + 1.0) * 10_000.0)
                    .with_employees(i % 15)
                    .with_reviews_summary(i * 10, 1.0 + (i % 5) as f64)
                    .with_business_age((i % 30) as f64)
                    .with_address(format!("{i} Street{i} Rd"))
            })
            .collect();
        let m = EntropyCalculator::new("restaurant").calculate(&businesses);
        for v in [
            m.market_entropy,
            m.pricing_volatility,
            m.quality_variance,
            m.geographic_dispersion,
            m.temporal_instability,
            m.competitive_intensity,
            m.chaos_index(),
        ] {
            assert!((0.0..=1.0).contains(&v), "value {v} out of bounds");
        }
    }
}
