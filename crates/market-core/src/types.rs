use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, MarketResult};

/// Rating-derived sentiment bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// rating >= 4 is positive, <= 2 negative, anything between neutral
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 4.0 {
            Sentiment::Positive
        } else if rating <= 2.0 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

/// Text-derived indicators attached to a review once it has been scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaosFlags {
    pub pricing_inconsistency: bool,
    pub service_volatility: bool,
    pub ownership_change: bool,
    pub quality_fluctuation: bool,
}

impl ChaosFlags {
    pub fn any(&self) -> bool {
        self.pricing_inconsistency
            || self.service_volatility
            || self.ownership_change
            || self.quality_fluctuation
    }
}

/// Customer review as collected from a directory source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: f64,
    pub text: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub source: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub chaos_flags: ChaosFlags,
}

impl Review {
    pub fn new(rating: f64, text: impl Into<String>, date: Option<DateTime<Utc>>, source: impl Into<String>) -> Self {
        Self {
            rating,
            text: text.into(),
            date,
            source: source.into(),
            sentiment: Sentiment::from_rating(rating),
            chaos_flags: ChaosFlags::default(),
        }
    }

    /// Scored copy of this review. Reviews are never mutated in place.
    pub fn with_chaos_flags(&self, flags: ChaosFlags) -> Self {
        Self {
            chaos_flags: flags,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> MarketResult<()> {
        if !(1.0..=5.0).contains(&self.rating) {
            return Err(MarketError::InvalidData(format!(
                "review rating {} outside [1, 5]",
                self.rating
            )));
        }
        Ok(())
    }
}

/// One observed business in a (zip, industry) market.
///
/// Numeric fields are `None` when the source did not report them. Calculators
/// exclude absent values instead of treating them as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessObservation {
    pub id: String,
    pub name: String,
    pub address: String,
    pub zip_code: String,
    pub industry: String,
    #[serde(default)]
    pub estimated_revenue: Option<f64>,
    #[serde(default)]
    pub employees: Option<u32>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    /// Years in operation
    #[serde(default)]
    pub business_age: Option<f64>,
    #[serde(default)]
    pub owner_age: Option<u32>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub data_quality: f64,
    pub source: String,
}

impl BusinessObservation {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        zip_code: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: String::new(),
            zip_code: zip_code.into(),
            industry: industry.into(),
            estimated_revenue: None,
            employees: None,
            review_count: None,
            average_rating: None,
            business_age: None,
            owner_age: None,
            reviews: Vec::new(),
            data_quality: 0.5,
            source: "unknown".to_string(),
        }
    }

    pub fn with_address(self, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..self
        }
    }

    pub fn with_revenue(self, revenue: f64) -> Self {
        Self {
            estimated_revenue: Some(revenue),
            ..self
        }
    }

    pub fn with_employees(self, employees: u32) -> Self {
        Self {
            employees: Some(employees),
            ..self
        }
    }

    pub fn with_reviews_summary(self, review_count: u32, average_rating: f64) -> Self {
        Self {
            review_count: Some(review_count),
            average_rating: Some(average_rating),
            ..self
        }
    }

    pub fn with_business_age(self, years: f64) -> Self {
        Self {
            business_age: Some(years),
            ..self
        }
    }

    pub fn with_owner_age(self, age: u32) -> Self {
        Self {
            owner_age: Some(age),
            ..self
        }
    }

    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        Self { reviews, ..self }
    }

    pub fn with_source(self, source: impl Into<String>, data_quality: f64) -> Self {
        Self {
            source: source.into(),
            data_quality,
            ..self
        }
    }

    /// Revenue used for share computations: an unobserved revenue holds no share.
    pub fn revenue_for_share(&self) -> f64 {
        self.estimated_revenue.unwrap_or(0.0).max(0.0)
    }

    pub fn validate(&self) -> MarketResult<()> {
        if let Some(rev) = self.estimated_revenue {
            if rev < 0.0 || !rev.is_finite() {
                return Err(MarketError::InvalidData(format!(
                    "{}: estimated revenue must be non-negative, got {rev}",
                    self.name
                )));
            }
        }
        if let Some(age) = self.business_age {
            if age < 0.0 || !age.is_finite() {
                return Err(MarketError::InvalidData(format!(
                    "{}: business age must be non-negative, got {age}",
                    self.name
                )));
            }
        }
        if let Some(rating) = self.average_rating {
            if !(1.0..=5.0).contains(&rating) {
                return Err(MarketError::InvalidData(format!(
                    "{}: average rating {rating} outside [1, 5]",
                    self.name
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.data_quality) {
            return Err(MarketError::InvalidData(format!(
                "{}: data quality {} outside [0, 1]",
                self.name, self.data_quality
            )));
        }
        for review in &self.reviews {
            review.validate()?;
        }
        Ok(())
    }
}

/// One paid-search observation: keyword volume, cost per click, competition (0-1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdsObservation {
    pub monthly_volume: f64,
    pub cpc: f64,
    pub competition: f64,
}

/// Operational signals for a single business, consumed by the AOA scorer
/// and the Monte Carlo quality multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalSignals {
    pub average_rating: f64,
    pub review_count: u32,
    /// Standard deviation of individual review ratings
    #[serde(default)]
    pub rating_std_dev: f64,
    pub reviews_last_12m: u32,
    /// Review count for the 12 months before that; `None` when unknown
    #[serde(default)]
    pub reviews_prior_12m: Option<u32>,
    /// Current market-interest index (search trend or similar)
    #[serde(default)]
    pub current_interest: Option<f64>,
    /// Long-run average of the same interest index
    #[serde(default)]
    pub average_interest: Option<f64>,
    pub business_age_years: f64,
    #[serde(default)]
    pub monthly_review_counts: Vec<u32>,
    /// Share of the local market held by competitors, 0-1
    #[serde(default)]
    pub competitor_density: f64,
    /// Website / listing / social completeness, 0-1
    #[serde(default)]
    pub digital_presence: f64,
    #[serde(default)]
    pub cac: Option<f64>,
    #[serde(default)]
    pub average_ticket: Option<f64>,
    #[serde(default)]
    pub gross_margin: Option<f64>,
}

impl OperationalSignals {
    /// Ratio of last-12-month reviews to the prior 12 months, if history exists
    pub fn review_velocity_ratio(&self) -> Option<f64> {
        match self.reviews_prior_12m {
            Some(prior) if prior > 0 => Some(self.reviews_last_12m as f64 / prior as f64),
            _ => None,
        }
    }

    /// Current market interest relative to its long-run average
    pub fn interest_trend_ratio(&self) -> Option<f64> {
        match (self.current_interest, self.average_interest) {
            (Some(cur), Some(avg)) if avg > 0.0 => Some(cur / avg),
            _ => None,
        }
    }
}

/// Everything the valuation bundle needs for one business
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSignals {
    pub business_name: String,
    pub industry: String,
    #[serde(default)]
    pub zip_code: String,
    pub operational: OperationalSignals,
    #[serde(default)]
    pub ads: Vec<AdsObservation>,
    /// Foot-traffic popularity index, 0-100
    #[serde(default)]
    pub popularity_index: Option<f64>,
    #[serde(default)]
    pub median_income: Option<f64>,
    #[serde(default)]
    pub population: Option<u64>,
}

fn finite_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// NaN and infinities fail both checks below.
fn non_negative(field: &str, value: Option<f64>) -> MarketResult<()> {
    match value {
        Some(v) if !finite_non_negative(v) => Err(MarketError::InvalidData(format!(
            "{field} must be a finite non-negative number, got {v}"
        ))),
        _ => Ok(()),
    }
}

fn unit_interval(field: &str, value: Option<f64>) -> MarketResult<()> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(MarketError::InvalidData(format!(
            "{field} must be within [0, 1], got {v}"
        ))),
        _ => Ok(()),
    }
}

impl BusinessSignals {
    pub fn validate(&self) -> MarketResult<()> {
        if self.business_name.trim().is_empty() {
            return Err(MarketError::MissingInput("business_name".to_string()));
        }
        if self.industry.trim().is_empty() {
            return Err(MarketError::MissingInput("industry".to_string()));
        }
        let op = &self.operational;
        if !(1.0..=5.0).contains(&op.average_rating) {
            return Err(MarketError::InvalidData(format!(
                "average rating {} outside [1, 5]",
                op.average_rating
            )));
        }
        non_negative("business_age_years", Some(op.business_age_years))?;
        non_negative("rating_std_dev", Some(op.rating_std_dev))?;
        unit_interval("competitor_density", Some(op.competitor_density))?;
        unit_interval("digital_presence", Some(op.digital_presence))?;
        if op.gross_margin.is_some_and(|m| !m.is_finite() || m > 1.0) {
            return Err(MarketError::InvalidData("gross_margin must be a finite fraction".to_string()));
        }
        non_negative("current_interest", op.current_interest)?;
        non_negative("average_interest", op.average_interest)?;
        non_negative("cac", op.cac)?;
        non_negative("average_ticket", op.average_ticket)?;
        non_negative("popularity_index", self.popularity_index)?;
        non_negative("median_income", self.median_income)?;
        for ad in &self.ads {
            if !finite_non_negative(ad.monthly_volume)
                || !finite_non_negative(ad.cpc)
                || !(0.0..=1.0).contains(&ad.competition)
            {
                return Err(MarketError::InvalidData(format!(
                    "invalid ads observation: volume {}, cpc {}, competition {}",
                    ad.monthly_volume, ad.cpc, ad.competition
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_buckets_follow_rating() {
        assert_eq!(Sentiment::from_rating(5.0), Sentiment::Positive);
        assert_eq!(Sentiment::from_rating(4.0), Sentiment::Positive);
        assert_eq!(Sentiment::from_rating(3.0), Sentiment::Neutral);
        assert_eq!(Sentiment::from_rating(2.0), Sentiment::Negative);
        assert_eq!(Sentiment::from_rating(1.0), Sentiment::Negative);
    }

    #[test]
    fn copy_on_update_keeps_original() {
        let base = BusinessObservation::new("b1", "Acme HVAC", "94107", "hvac");
        let enriched = base.clone().with_revenue(250_000.0).with_employees(4);
        assert!(base.estimated_revenue.is_none());
        assert_eq!(enriched.estimated_revenue, Some(250_000.0));
        assert_eq!(enriched.employees, Some(4));
    }

    #[test]
    fn validate_rejects_negative_revenue() {
        let b = BusinessObservation::new("b1", "Acme", "94107", "hvac").with_revenue(-1.0);
        assert!(matches!(b.validate(), Err(MarketError::InvalidData(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_review() {
        let b = BusinessObservation::new("b1", "Acme", "94107", "hvac")
            .with_reviews(vec![Review::new(6.0, "great", None, "test")]);
        assert!(b.validate().is_err());
    }

    fn valid_signals() -> BusinessSignals {
        BusinessSignals {
            business_name: "Acme".to_string(),
            industry: "hvac".to_string(),
            zip_code: "94107".to_string(),
            operational: OperationalSignals {
                average_rating: 4.5,
                review_count: 40,
                rating_std_dev: 0.5,
                reviews_last_12m: 12,
                reviews_prior_12m: None,
                current_interest: None,
                average_interest: None,
                business_age_years: 6.0,
                monthly_review_counts: Vec::new(),
                competitor_density: 0.5,
                digital_presence: 0.5,
                cac: None,
                average_ticket: None,
                gross_margin: None,
            },
            ads: vec![AdsObservation {
                monthly_volume: 1000.0,
                cpc: 4.0,
                competition: 0.5,
            }],
            popularity_index: None,
            median_income: None,
            population: None,
        }
    }

    #[test]
    fn signals_reject_non_finite_numbers() {
        assert!(valid_signals().validate().is_ok());

        let cases: [fn(&mut BusinessSignals); 12] = [
            |s| s.operational.business_age_years = f64::NAN,
            |s| s.operational.rating_std_dev = f64::INFINITY,
            |s| s.operational.competitor_density = f64::NAN,
            |s| s.operational.digital_presence = 1.5,
            |s| s.operational.cac = Some(f64::NAN),
            |s| s.operational.average_ticket = Some(-3.0),
            |s| s.operational.gross_margin = Some(f64::NAN),
            |s| s.popularity_index = Some(f64::NAN),
            |s| s.median_income = Some(f64::INFINITY),
            |s| s.ads[0].monthly_volume = f64::NAN,
            |s| s.ads[0].cpc = f64::INFINITY,
            |s| s.ads[0].competition = f64::NAN,
        ];
        for mutate in cases {
            let mut signals = valid_signals();
            mutate(&mut signals);
            assert!(matches!(signals.validate(), Err(MarketError::InvalidData(_))));
        }
    }

    #[test]
    fn velocity_ratio_requires_history() {
        let mut signals = OperationalSignals {
            average_rating: 4.5,
            review_count: 100,
            rating_std_dev: 0.5,
            reviews_last_12m: 30,
            reviews_prior_12m: None,
            current_interest: None,
            average_interest: None,
            business_age_years: 8.0,
            monthly_review_counts: vec![],
            competitor_density: 0.4,
            digital_presence: 0.6,
            cac: None,
            average_ticket: None,
            gross_margin: None,
        };
        assert!(signals.review_velocity_ratio().is_none());
        signals.reviews_prior_12m = Some(20);
        assert_eq!(signals.review_velocity_ratio(), Some(1.5));
    }
}
