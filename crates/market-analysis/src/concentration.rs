//! Market Concentration
//!
//! HHI, mom-and-pop density, Gini and descriptive metrics for one
//! (zip, industry) market.

use chrono::{DateTime, Utc};
use market_core::stats::{mean, median, sorted_copy};
use market_core::{BusinessObservation, MarketError, MarketResult};
use serde::{Deserialize, Serialize};

/// HHI band interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcentrationLevel {
    /// HHI < 1500
    Fragmented,
    /// 1500 <= HHI <= 2500
    Moderate,
    /// HHI > 2500
    Concentrated,
}

impl ConcentrationLevel {
    pub fn from_hhi(hhi: f64) -> Self {
        if hhi < 1500.0 {
            ConcentrationLevel::Fragmented
        } else if hhi <= 2500.0 {
            ConcentrationLevel::Moderate
        } else {
            ConcentrationLevel::Concentrated
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            ConcentrationLevel::Fragmented => "Fragmented",
            ConcentrationLevel::Moderate => "Moderately Concentrated",
            ConcentrationLevel::Concentrated => "Highly Concentrated",
        }
    }
}

/// Thresholds a business must satisfy simultaneously to count as mom-and-pop.
///
/// All comparisons are strict. A business with any of the three fields
/// unobserved does not qualify.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomPopPolicy {
    pub max_employees: u32,
    pub max_reviews: u32,
    pub max_age_years: f64,
}

impl Default for MomPopPolicy {
    fn default() -> Self {
        Self {
            max_employees: 10,
            max_reviews: 50,
            max_age_years: 20.0,
        }
    }
}

impl MomPopPolicy {
    pub fn qualifies(&self, business: &BusinessObservation) -> bool {
        match (business.employees, business.review_count, business.business_age) {
            (Some(emp), Some(reviews), Some(age)) => {
                emp < self.max_employees && reviews < self.max_reviews && age < self.max_age_years
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketShare {
    pub business_id: String,
    pub name: String,
    /// Percent of total market revenue (0-100)
    pub share_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub zip_code: String,
    pub industry: String,
    pub computed_at: DateTime<Utc>,
    pub total_businesses: usize,
    /// Businesses that reported a revenue estimate
    pub businesses_with_revenue: usize,
    pub total_revenue: f64,
    pub average_revenue: f64,
    pub median_revenue: f64,
    pub average_employees: f64,
    pub average_business_age: f64,
    /// Combined share of the five largest businesses, percent
    pub top5_share_pct: f64,
    pub hhi: f64,
    pub concentration_level: ConcentrationLevel,
    pub mom_pop_density: f64,
    pub gini_coefficient: f64,
    pub market_shares: Vec<MarketShare>,
}

fn require_non_empty(businesses: &[BusinessObservation], what: &str) -> MarketResult<()> {
    if businesses.is_empty() {
        return Err(MarketError::empty_input(what));
    }
    Ok(())
}

/// Market share of each business in percent. Equal split when total revenue is zero.
pub fn market_shares(businesses: &[BusinessObservation]) -> MarketResult<Vec<f64>> {
    require_non_empty(businesses, "market share")?;
    let n = businesses.len() as f64;
    let total: f64 = businesses.iter().map(|b| b.revenue_for_share()).sum();
    if total <= 0.0 {
        return Ok(vec![100.0 / n; businesses.len()]);
    }
    Ok(businesses
        .iter()
        .map(|b| b.revenue_for_share() * 100.0 / total)
        .collect())
}

/// Herfindahl-Hirschman Index over percent shares, in [0, 10000].
pub fn hhi(businesses: &[BusinessObservation]) -> MarketResult<f64> {
    let shares = market_shares(businesses)?;
    let sum: f64 = shares.iter().map(|s| s * s).sum();
    Ok(sum.clamp(0.0, 10_000.0))
}

/// Fraction of businesses meeting every mom-and-pop threshold.
pub fn mom_pop_density(businesses: &[BusinessObservation], policy: &MomPopPolicy) -> MarketResult<f64> {
    require_non_empty(businesses, "mom-and-pop density")?;
    let qualifying = businesses.iter().filter(|b| policy.qualifies(b)).count();
    Ok(qualifying as f64 / businesses.len() as f64)
}

/// Gini coefficient of a non-negative distribution.
/// Uses the rank-weighted form `2·Σ(i·x_i) / (n·Σx) − (n+1)/n` over ascending values.
pub fn gini_coefficient(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i as f64 + 1.0) * x)
        .sum();
    let n_f = n as f64;
    let g = 2.0 * weighted / (n_f * total) - (n_f + 1.0) / n_f;
    g.clamp(0.0, 1.0)
}

/// Compute every concentration metric for one market.
pub fn calculate_market_metrics(
    zip_code: &str,
    industry: &str,
    businesses: &[BusinessObservation],
    policy: &MomPopPolicy,
) -> MarketResult<MarketMetrics> {
    if businesses.is_empty() {
        return Err(MarketError::InsufficientData {
            zip: zip_code.to_string(),
            industry: industry.to_string(),
            reason: "no businesses to compute concentration over".to_string(),
        });
    }

    let shares = market_shares(businesses)?;
    let hhi_value = hhi(businesses)?;
    let density = mom_pop_density(businesses, policy)?;

    let revenues: Vec<f64> = businesses
        .iter()
        .filter_map(|b| b.estimated_revenue)
        .collect();
    let employees: Vec<f64> = businesses
        .iter()
        .filter_map(|b| b.employees.map(|e| e as f64))
        .collect();
    let ages: Vec<f64> = businesses.iter().filter_map(|b| b.business_age).collect();

    let mut sorted_shares = shares.clone();
    sorted_shares.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let top5_share_pct: f64 = sorted_shares.iter().take(5).sum::<f64>().min(100.0);

    let market_shares = businesses
        .iter()
        .zip(shares.iter())
        .map(|(b, s)| MarketShare {
            business_id: b.id.clone(),
            name: b.name.clone(),
            share_pct: *s,
        })
        .collect();

    let metrics = MarketMetrics {
        zip_code: zip_code.to_string(),
        industry: industry.to_string(),
        computed_at: Utc::now(),
        total_businesses: businesses.len(),
        businesses_with_revenue: revenues.len(),
        total_revenue: revenues.iter().sum(),
        average_revenue: mean(&revenues),
        median_revenue: median(&revenues),
        average_employees: mean(&employees),
        average_business_age: mean(&ages),
        top5_share_pct,
        hhi: hhi_value,
        concentration_level: ConcentrationLevel::from_hhi(hhi_value),
        mom_pop_density: density,
        gini_coefficient: gini_coefficient(&revenues),
        market_shares,
    };

    tracing::debug!(
        "Market {}/{}: n={} hhi={:.1} mom_pop={:.2} gini={:.3}",
        zip_code,
        industry,
        metrics.total_businesses,
        metrics.hhi,
        metrics.mom_pop_density,
        metrics.gini_coefficient
    );

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn biz(id: &str, revenue: f64) -> BusinessObservation {
        BusinessObservation::new(id, format!("Biz {id}"), "94107", "hvac").with_revenue(revenue)
    }

    #[test]
    fn equal_revenue_gives_ten_thousand_over_n() {
        for n in 1..=12 {
            let businesses: Vec<_> = (0..n).map(|i| biz(&i.to_string(), 200_000.0)).collect();
            let value = hhi(&businesses).unwrap();
            assert_relative_eq!(value, 10_000.0 / n as f64, epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_revenue_splits_evenly() {
        let businesses = vec![
            BusinessObservation::new("a", "A", "1", "x"),
            BusinessObservation::new("b", "B", "1", "x"),
            BusinessObservation::new("c", "C", "1", "x"),
            BusinessObservation::new("d", "D", "1", "x"),
        ];
        let shares = market_shares(&businesses).unwrap();
        assert!(shares.iter().all(|s| (s - 25.0).abs() < 1e-12));
        assert_relative_eq!(hhi(&businesses).unwrap(), 2500.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_market_is_an_error() {
        assert!(matches!(hhi(&[]), Err(MarketError::InsufficientData { .. })));
        let err = calculate_market_metrics("94107", "hvac", &[], &MomPopPolicy::default()).unwrap_err();
        match err {
            MarketError::InsufficientData { zip, industry, .. } => {
                assert_eq!(zip, "94107");
                assert_eq!(industry, "hvac");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn mom_pop_requires_all_three_thresholds() {
        let small = BusinessObservation::new("a", "A", "1", "x")
            .with_employees(3)
            .with_reviews_summary(10, 4.0)
            .with_business_age(5.0);
        let old = small.clone().with_business_age(25.0);
        let big = small.clone().with_employees(40);
        let unknown = BusinessObservation::new("d", "D", "1", "x").with_employees(2);
        let density = mom_pop_density(&[small, old, big, unknown], &MomPopPolicy::default()).unwrap();
        assert_relative_eq!(density, 0.25);
    }

    #[test]
    fn mom_pop_density_non_increasing_as_employee_threshold_shrinks() {
        let businesses: Vec<_> = (0..20)
            .map(|i| {
                BusinessObservation::new(i.to_string(), "B", "1", "x")
                    .with_employees(i)
                    .with_reviews_summary(10, 4.0)
                    .with_business_age(3.0)
            })
            .collect();
        let mut previous = f64::INFINITY;
        for threshold in (0..=20).rev() {
            let policy = MomPopPolicy {
                max_employees: threshold,
                ..MomPopPolicy::default()
            };
            let density = mom_pop_density(&businesses, &policy).unwrap();
            assert!(density <= previous);
            previous = density;
        }
    }

    #[test]
    fn gini_bounds() {
        assert_eq!(gini_coefficient(&[100.0, 100.0, 100.0]), 0.0);
        let unequal = gini_coefficient(&[0.0, 0.0, 0.0, 1000.0]);
        assert_relative_eq!(unequal, 0.75, epsilon = 1e-12);
        assert_eq!(gini_coefficient(&[5.0]), 0.0);
    }

    #[test]
    fn metrics_descriptives() {
        let businesses = vec![
            biz("a", 100_000.0).with_employees(2).with_business_age(4.0),
            biz("b", 300_000.0).with_employees(6).with_business_age(8.0),
            BusinessObservation::new("c", "C", "94107", "hvac").with_employees(4),
        ];
        let m = calculate_market_metrics("94107", "hvac", &businesses, &MomPopPolicy::default()).unwrap();
        assert_eq!(m.total_businesses, 3);
        assert_eq!(m.businesses_with_revenue, 2);
        assert_relative_eq!(m.total_revenue, 400_000.0);
        assert_relative_eq!(m.average_revenue, 200_000.0);
        assert_relative_eq!(m.median_revenue, 200_000.0);
        assert_relative_eq!(m.average_employees, 4.0);
        assert_relative_eq!(m.average_business_age, 6.0);
        assert_relative_eq!(m.top5_share_pct, 100.0, epsilon = 1e-9);
        assert_relative_eq!(m.hhi, 25.0 * 25.0 + 75.0 * 75.0, epsilon = 1e-9);
        assert_eq!(m.concentration_level, ConcentrationLevel::Concentrated);
    }
}
