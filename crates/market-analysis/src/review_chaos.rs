//! Review Chaos Analysis
//!
//! Scores review text for signs of an unstable operator (inconsistent
//! pricing, erratic service, ownership turnover, slipping quality) and
//! detects rating trends and seasonality over time.

use chrono::Datelike;
use market_core::stats::{clamp_unit, mean, population_std_dev};
use market_core::{BusinessObservation, ChaosFlags, Review, Sentiment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const PRICING_WEIGHT: f64 = 0.25;
const SERVICE_WEIGHT: f64 = 0.25;
const OWNERSHIP_WEIGHT: f64 = 0.20;
const QUALITY_WEIGHT: f64 = 0.20;
const MISMATCH_WEIGHT: f64 = 0.10;

/// Business chaos score above which the business is considered a chaotic actor
pub const CHAOTIC_THRESHOLD: f64 = 0.7;
const TREND_WINDOW: usize = 5;
const TREND_THRESHOLD: f64 = 0.3;
const MIN_REVIEWS_FOR_TREND: usize = 6;
const MIN_REVIEWS_FOR_SEASONALITY: usize = 12;
const SEASONALITY_THRESHOLD: f64 = 0.3;

const PRICING_KEYWORDS: &[&str] = &[
    "overcharged", "hidden fee", "expensive", "price changed", "quoted",
    "charged more", "bait and switch", "upcharge", "inconsistent pricing", "surprise bill",
];
const SERVICE_KEYWORDS: &[&str] = &[
    "hit or miss", "inconsistent", "sometimes", "depends on who", "unreliable",
    "no show", "never showed", "late", "rude", "slow",
];
const OWNERSHIP_KEYWORDS: &[&str] = &[
    "new owner", "new management", "under new", "changed hands", "bought out",
    "sold the business", "management changed", "ownership",
];
const QUALITY_KEYWORDS: &[&str] = &[
    "went downhill", "not as good", "used to be", "declined", "worse",
    "quality dropped", "mediocre", "sloppy",
];
const POSITIVE_WORDS: &[&str] = &[
    "great", "excellent", "amazing", "friendly", "professional", "recommend",
    "best", "awesome", "fantastic", "helpful", "love", "perfect",
];
const NEGATIVE_WORDS: &[&str] = &[
    "terrible", "awful", "worst", "horrible", "disappointed", "scam",
    "poor", "waste", "avoid", "bad", "never again", "unprofessional",
];

/// Per-review breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewChaosScore {
    pub pricing: f64,
    pub service: f64,
    pub ownership: f64,
    pub quality: f64,
    pub sentiment_mismatch: bool,
    pub score: f64,
    pub flags: ChaosFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessChaos {
    pub business_id: String,
    pub name: String,
    pub chaos_score: f64,
    pub reviews_analyzed: usize,
    pub flagged_reviews: usize,
    pub is_chaotic: bool,
}

/// How many reviews across the market raised each indicator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorCounts {
    pub pricing_inconsistency: usize,
    pub service_volatility: usize,
    pub ownership_change: usize,
    pub quality_fluctuation: usize,
    pub sentiment_mismatch: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketChaosSummary {
    pub chaotic_actor_count: usize,
    pub chaotic_actor_ratio: f64,
    pub average_chaos_score: f64,
    pub indicator_counts: IndicatorCounts,
    pub businesses: Vec<BusinessChaos>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalPattern {
    pub dated_reviews: usize,
    /// Std dev of ratings in date order
    pub rating_volatility: f64,
    pub trend: Trend,
    /// Leading-window average minus trailing-window average
    pub trend_delta: f64,
    pub seasonal: bool,
    /// Average rating per calendar month (1-12) that has reviews
    pub monthly_averages: BTreeMap<u32, f64>,
}

/// Lowercased alphanumeric words; punctuation and hyphens separate words.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whole-word match of a one- or multi-word keyword.
fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(token, word)| token == word))
}

pub struct ReviewChaosAnalyzer {
    pricing: Vec<&'static str>,
    service: Vec<&'static str>,
    ownership: Vec<&'static str>,
    quality: Vec<&'static str>,
    positive: Vec<&'static str>,
    negative: Vec<&'static str>,
}

impl Default for ReviewChaosAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewChaosAnalyzer {
    pub fn new() -> Self {
        Self {
            pricing: PRICING_KEYWORDS.to_vec(),
            service: SERVICE_KEYWORDS.to_vec(),
            ownership: OWNERSHIP_KEYWORDS.to_vec(),
            quality: QUALITY_KEYWORDS.to_vec(),
            positive: POSITIVE_WORDS.to_vec(),
            negative: NEGATIVE_WORDS.to_vec(),
        }
    }

    /// Matched keywords / category size, doubled and capped at 1
    fn category_score(tokens: &[String], keywords: &[&str]) -> f64 {
        if keywords.is_empty() {
            return 0.0;
        }
        let matched = keywords.iter().filter(|k| contains_phrase(tokens, k)).count();
        clamp_unit(matched as f64 / keywords.len() as f64 * 2.0)
    }

    fn lexical_sentiment(&self, tokens: &[String]) -> Sentiment {
        let pos = self.positive.iter().filter(|w| contains_phrase(tokens, w)).count();
        let neg = self.negative.iter().filter(|w| contains_phrase(tokens, w)).count();
        match pos.cmp(&neg) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }

    pub fn score_review(&self, review: &Review) -> ReviewChaosScore {
        let tokens = tokenize(&review.text);
        let pricing = Self::category_score(&tokens, &self.pricing);
        let service = Self::category_score(&tokens, &self.service);
        let ownership = Self::category_score(&tokens, &self.ownership);
        let quality = Self::category_score(&tokens, &self.quality);

        let lexical = self.lexical_sentiment(&tokens);
        let rated = Sentiment::from_rating(review.rating);
        let sentiment_mismatch =
            lexical != Sentiment::Neutral && rated != Sentiment::Neutral && lexical != rated;

        let score = clamp_unit(
            pricing * PRICING_WEIGHT
                + service * SERVICE_WEIGHT
                + ownership * OWNERSHIP_WEIGHT
                + quality * QUALITY_WEIGHT
                + if sentiment_mismatch { MISMATCH_WEIGHT } else { 0.0 },
        );

        ReviewChaosScore {
            pricing,
            service,
            ownership,
            quality,
            sentiment_mismatch,
            score,
            flags: ChaosFlags {
                pricing_inconsistency: pricing > 0.0,
                service_volatility: service > 0.0,
                ownership_change: ownership > 0.0,
                quality_fluctuation: quality > 0.0,
            },
        }
    }

    /// Scored copies of the given reviews
    pub fn score_reviews(&self, reviews: &[Review]) -> Vec<Review> {
        reviews
            .iter()
            .map(|r| r.with_chaos_flags(self.score_review(r).flags))
            .collect()
    }

    pub fn business_chaos(&self, business: &BusinessObservation) -> BusinessChaos {
        let scores: Vec<ReviewChaosScore> = business.reviews.iter().map(|r| self.score_review(r)).collect();
        let chaos_score = clamp_unit(mean(&scores.iter().map(|s| s.score).collect::<Vec<_>>()));
        BusinessChaos {
            business_id: business.id.clone(),
            name: business.name.clone(),
            chaos_score,
            reviews_analyzed: scores.len(),
            flagged_reviews: scores
                .iter()
                .filter(|s| s.flags.any() || s.sentiment_mismatch)
                .count(),
            is_chaotic: chaos_score > CHAOTIC_THRESHOLD,
        }
    }

    pub fn analyze_market(&self, businesses: &[BusinessObservation]) -> MarketChaosSummary {
        let mut counts = IndicatorCounts::default();
        let mut per_business = Vec::with_capacity(businesses.len());

        for business in businesses {
            for review in &business.reviews {
                let s = self.score_review(review);
                counts.pricing_inconsistency += s.flags.pricing_inconsistency as usize;
                counts.service_volatility += s.flags.service_volatility as usize;
                counts.ownership_change += s.flags.ownership_change as usize;
                counts.quality_fluctuation += s.flags.quality_fluctuation as usize;
                counts.sentiment_mismatch += s.sentiment_mismatch as usize;
            }
            per_business.push(self.business_chaos(business));
        }

        let chaotic_actor_count = per_business.iter().filter(|b| b.is_chaotic).count();
        let chaotic_actor_ratio = if per_business.is_empty() {
            0.0
        } else {
            chaotic_actor_count as f64 / per_business.len() as f64
        };
        let average_chaos_score = mean(&per_business.iter().map(|b| b.chaos_score).collect::<Vec<_>>());

        tracing::debug!(
            "Review chaos: {} chaotic of {} businesses, mean score {:.3}",
            chaotic_actor_count,
            per_business.len(),
            average_chaos_score
        );

        MarketChaosSummary {
            chaotic_actor_count,
            chaotic_actor_ratio,
            average_chaos_score,
            indicator_counts: counts,
            businesses: per_business,
        }
    }

    /// Rating volatility, trend and seasonality over dated reviews.
    pub fn analyze_temporal(&self, reviews: &[Review]) -> TemporalPattern {
        let mut dated: Vec<&Review> = reviews.iter().filter(|r| r.date.is_some()).collect();
        dated.sort_by_key(|r| r.date);
        let ratings: Vec<f64> = dated.iter().map(|r| r.rating).collect();

        let (trend, trend_delta) = if ratings.len() >= MIN_REVIEWS_FOR_TREND {
            let window = TREND_WINDOW.min(ratings.len());
            let trailing = mean(&ratings[..window]);
            let leading = mean(&ratings[ratings.len() - window..]);
            let delta = leading - trailing;
            let trend = if delta > TREND_THRESHOLD {
                Trend::Improving
            } else if delta < -TREND_THRESHOLD {
                Trend::Declining
            } else {
                Trend::Stable
            };
            (trend, delta)
        } else {
            (Trend::Stable, 0.0)
        };

        let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for review in &dated {
            if let Some(date) = review.date {
                by_month.entry(date.month()).or_default().push(review.rating);
            }
        }
        let monthly_averages: BTreeMap<u32, f64> = by_month
            .into_iter()
            .map(|(month, values)| (month, mean(&values)))
            .collect();

        let seasonal = dated.len() >= MIN_REVIEWS_FOR_SEASONALITY
            && monthly_averages.len() >= 2
            && population_std_dev(&monthly_averages.values().copied().collect::<Vec<_>>())
                > SEASONALITY_THRESHOLD;

        TemporalPattern {
            dated_reviews: dated.len(),
            rating_volatility: population_std_dev(&ratings),
            trend,
            trend_delta,
            seasonal,
            monthly_averages,
        }
    }
}
