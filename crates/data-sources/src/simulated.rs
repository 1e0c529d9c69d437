use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use market_core::{BusinessObservation, DataSourceProvider, MarketError, Review};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

const NAME_PREFIXES: &[&str] = &[
    "Summit", "Precision", "Family", "Elite", "Hometown", "Reliable", "Pioneer", "Metro", "Golden", "Eagle",
    "Lakeside", "Northside", "Blue Sky", "Heritage", "Apex", "Main Street", "Cornerstone", "Liberty",
];
const NAME_SUFFIXES: &[&str] = &["Co", "Services", "Pros", "& Sons", "Group", "Experts", "LLC", "Solutions"];
const STREETS: &[&str] = &[
    "Main", "Oak", "Maple", "Cedar", "Elm", "Washington", "Lake", "Hill", "Park", "Pine", "Walnut", "Sunset",
];
const STREET_TYPES: &[&str] = &["St", "Ave", "Rd", "Blvd", "Dr", "Ln"];

const REVIEW_TEMPLATES: &[(f64, &str)] = &[
    (5.0, "Great service, very professional and on time"),
    (5.0, "Excellent work, friendly crew, highly recommend"),
    (4.0, "Good job overall, fair price"),
    (4.0, "Helpful staff and quick turnaround"),
    (3.0, "Hit or miss lately, sometimes great and sometimes slow"),
    (3.0, "Under new management and it shows, not the same as before"),
    (2.0, "Prices went up and they charged more than the quote"),
    (2.0, "Quality went downhill since the new owner took over"),
    (1.0, "Terrible experience, rude staff, overcharged me"),
    (1.0, "Never showed up, awful communication"),
];

/// Deterministic stand-in for a business-directory source.
///
/// The market roster is derived from a SHA-256 of `zip|industry`, so every
/// simulated source sees the same underlying businesses. Each source then
/// sees its own subset with its own revenue noise, seeded from its name.
pub struct SimulatedProvider {
    name: String,
    data_quality: f64,
    coverage: f64,
    as_of: DateTime<Utc>,
}

fn seed_for(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn display_industry(industry: &str) -> String {
    industry
        .split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

impl SimulatedProvider {
    pub fn new(name: impl Into<String>, as_of: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            data_quality: 0.6,
            coverage: 0.85,
            as_of,
        }
    }

    pub fn with_data_quality(mut self, data_quality: f64) -> Self {
        self.data_quality = data_quality.clamp(0.0, 1.0);
        self
    }

    /// Probability that any given business in the market appears in this source
    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage = coverage.clamp(0.0, 1.0);
        self
    }

    fn reviews<R: Rng + ?Sized>(&self, rng: &mut R, rating: f64) -> Vec<Review> {
        let count = rng.gen_range(0..=12);
        (0..count)
            .map(|_| {
                // bias templates toward the business's own rating
                let target = (rating + rng.gen_range(-1.5..1.5)).round().clamp(1.0, 5.0);
                let candidates: Vec<&(f64, &str)> =
                    REVIEW_TEMPLATES.iter().filter(|(r, _)| *r == target).collect();
                let (stars, text) = candidates
                    .choose(rng)
                    .map(|t| **t)
                    .unwrap_or(REVIEW_TEMPLATES[0]);
                let date = self.as_of - Duration::days(rng.gen_range(0..1095));
                Review::new(stars, text, Some(date), self.name.clone())
            })
            .collect()
    }

    fn roster(&self, zip: &str, industry: &str) -> Vec<BusinessObservation> {
        let mut market_rng = ChaCha8Rng::seed_from_u64(seed_for(&format!("{zip}|{industry}")));
        let mut source_rng = ChaCha8Rng::seed_from_u64(seed_for(&format!("{}|{zip}|{industry}", self.name)));
        let industry_label = display_industry(industry);
        let size = market_rng.gen_range(8..=30);

        let mut businesses = Vec::with_capacity(size);
        for i in 0..size {
            // market-level attributes are drawn unconditionally so the roster
            // is identical across sources
            let name = format!(
                "{} {} {}",
                pick(&mut market_rng, NAME_PREFIXES),
                industry_label,
                pick(&mut market_rng, NAME_SUFFIXES)
            );
            let address = format!(
                "{} {} {}, {zip}",
                market_rng.gen_range(100..9999),
                pick(&mut market_rng, STREETS),
                pick(&mut market_rng, STREET_TYPES)
            );
            let base_revenue: f64 = market_rng.gen_range(120_000.0..2_400_000.0);
            let employees: u32 = market_rng.gen_range(1..=35);
            let review_count: u32 = market_rng.gen_range(3..=400);
            let rating: f64 = (market_rng.gen_range(2.8..5.0_f64) * 10.0).round() / 10.0;
            let age: f64 = market_rng.gen_range(1.0..40.0_f64).round();
            let owner_age: u32 = market_rng.gen_range(30..=78);
            let owner_known = market_rng.gen_bool(0.6);

            if !source_rng.gen_bool(self.coverage) {
                continue;
            }
            let noise = source_rng.gen_range(0.9..1.1);
            let mut business = BusinessObservation::new(format!("{}-{zip}-{i}", self.name), name, zip, industry)
                .with_address(address)
                .with_employees(employees)
                .with_reviews_summary(review_count, rating.min(5.0))
                .with_business_age(age)
                .with_source(self.name.clone(), self.data_quality);
            if source_rng.gen_bool(0.9) {
                business = business.with_revenue(base_revenue * noise);
            }
            if owner_known {
                business = business.with_owner_age(owner_age);
            }
            let reviews = self.reviews(&mut source_rng, rating);
            businesses.push(business.with_reviews(reviews));
        }
        businesses
    }
}

#[async_trait]
impl DataSourceProvider for SimulatedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_businesses(
        &self,
        zip: &str,
        industry: &str,
        limit: usize,
    ) -> Result<Vec<BusinessObservation>, MarketError> {
        if zip.trim().is_empty() {
            return Err(MarketError::MissingInput("zip".to_string()));
        }
        if industry.trim().is_empty() {
            return Err(MarketError::MissingInput("industry".to_string()));
        }
        let mut businesses = self.roster(zip.trim(), &industry.trim().to_lowercase());
        businesses.truncate(limit);
        debug!(source = %self.name, zip, industry, count = businesses.len(), "Simulated fetch");
        Ok(businesses)
    }
}
