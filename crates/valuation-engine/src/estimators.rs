//! The three independent revenue estimators and their adaptive blend.
//!
//! Each estimator is linear in the sampled job price, so the geography
//! multiplier is applied once to the price before any of them run.

use market_core::{AdsObservation, BusinessSignals, CategoryPrior, FunnelRates};

use crate::models::EnsembleWeights;

/// Floor on the sampled propensity so a near-zero draw cannot explode revenue
pub const MIN_PROPENSITY: f64 = 0.001;
/// Share of bookings attributable to walk-in traffic
pub const FOOT_TRAFFIC_BOOKING_SHARE: f64 = 0.3;
/// Popularity index at which a business sees `base_monthly_visits`
pub const REFERENCE_POPULARITY: f64 = 50.0;
/// Competition drag on click-through
pub const COMPETITION_CTR_DRAG: f64 = 0.3;

const REVIEW_BOOST_THRESHOLD: u32 = 20;
const ADS_BOOST_THRESHOLD: usize = 3;
const WEIGHT_BOOST: f64 = 0.2;

/// Annual revenue implied by review volume: reviews / propensity gives customers.
pub fn review_driven_revenue(reviews_last_12m: u32, propensity: f64, repeat_factor: f64, price: f64) -> f64 {
    if reviews_last_12m == 0 {
        return 0.0;
    }
    let customers = reviews_last_12m as f64 / propensity.max(MIN_PROPENSITY);
    customers * repeat_factor.max(0.0) * price
}

/// Click-through discounted by keyword competition.
pub fn effective_ctr(click_through: f64, competition: f64) -> f64 {
    click_through * (1.0 - COMPETITION_CTR_DRAG * competition.clamp(0.0, 1.0))
}

/// Annual revenue implied by paid-search demand.
pub fn ads_funnel_revenue(ads: &[AdsObservation], funnel: &FunnelRates, price: f64) -> f64 {
    let monthly_leads: f64 = ads
        .iter()
        .map(|ad| ad.monthly_volume.max(0.0) * effective_ctr(funnel.click_through, ad.competition) * funnel.conversion)
        .sum();
    monthly_leads * funnel.booking * 12.0 * price
}

/// Annual revenue implied by a foot-traffic popularity index (0-100).
pub fn foot_traffic_revenue(popularity_index: Option<f64>, prior: &CategoryPrior, price: f64) -> f64 {
    match popularity_index {
        Some(p) if p > 0.0 => {
            let monthly_visits = prior.base_monthly_visits * p.min(100.0) / REFERENCE_POPULARITY;
            monthly_visits * prior.funnel.booking * FOOT_TRAFFIC_BOOKING_SHARE * 12.0 * price
        }
        _ => 0.0,
    }
}

/// Adaptive ensemble weights for one business.
///
/// Starts from the default split, boosts the review and ads models when their
/// signal is rich, zeroes any model that has no input at all, then
/// renormalizes.
pub fn ensemble_weights(signals: &BusinessSignals) -> EnsembleWeights {
    let defaults = EnsembleWeights::default();
    let reviews = signals.operational.reviews_last_12m;

    let mut review = defaults.review;
    let mut ads = defaults.ads;
    let mut foot_traffic = defaults.foot_traffic;

    if reviews > REVIEW_BOOST_THRESHOLD {
        review += WEIGHT_BOOST;
    }
    if signals.ads.len() >= ADS_BOOST_THRESHOLD {
        ads += WEIGHT_BOOST;
    }
    if reviews == 0 {
        review = 0.0;
    }
    if signals.ads.is_empty() {
        ads = 0.0;
    }
    if !signals.popularity_index.is_some_and(|p| p > 0.0) {
        foot_traffic = 0.0;
    }

    let total = review + ads + foot_traffic;
    if total <= 0.0 {
        return defaults;
    }
    EnsembleWeights {
        review: review / total,
        ads: ads / total,
        foot_traffic: foot_traffic / total,
    }
}
