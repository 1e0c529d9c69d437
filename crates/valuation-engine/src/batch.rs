//! CSV batch valuation.
//!
//! One row per business. Required columns: `business_name`, `industry`,
//! `average_rating`, `review_count`, `reviews_last_12m`. Advertising
//! observations come from `ads_vol_i`, `ads_cpc_i`, `ads_comp_i` for
//! i in 1..=6; an observation is used only when its volume is present.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use market_analysis::operational::HIGH_TRANSITION_RISK;
use market_core::stats::{mean, median};
use market_core::{AdsObservation, BusinessSignals, MarketError, MarketResult, OperationalSignals};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::service::{BusinessValuation, ValuationService};

pub const CHUNK_SIZE: usize = 10;
pub const MAX_ADS_COLUMNS: usize = 6;
const TOP_OPPORTUNITIES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRowResult {
    /// 1-based data row (header excluded)
    pub row: usize,
    pub valuation: BusinessValuation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRowError {
    pub row: usize,
    pub business_name: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopOpportunity {
    pub row: usize,
    pub business_name: String,
    pub p50_valuation: f64,
    pub grade: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_valuation: f64,
    pub mean_valuation: f64,
    pub median_valuation: f64,
    pub min_valuation: f64,
    pub max_valuation: f64,
    pub grade_distribution: BTreeMap<String, usize>,
    pub top_opportunities: Vec<TopOpportunity>,
    pub high_transition_risk: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<BatchRowResult>,
    pub errors: Vec<BatchRowError>,
    pub summary: BatchSummary,
}

/// Column lookup by header name for one record.
struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn text(&self, name: &str) -> Option<&str> {
        self.columns
            .get(name)
            .and_then(|i| self.record.get(*i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn required_text(&self, name: &str) -> Result<String, String> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| format!("missing required field '{name}'"))
    }

    fn optional<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, String> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| format!("invalid value '{raw}' for '{name}'")),
        }
    }

    fn required<T: std::str::FromStr>(&self, name: &str) -> Result<T, String> {
        self.optional(name)?
            .ok_or_else(|| format!("missing required field '{name}'"))
    }
}

fn parse_signals(row: &Row<'_>) -> Result<BusinessSignals, String> {
    let mut ads = Vec::new();
    for i in 1..=MAX_ADS_COLUMNS {
        if let Some(volume) = row.optional::<f64>(&format!("ads_vol_{i}"))? {
            ads.push(AdsObservation {
                monthly_volume: volume,
                cpc: row.optional(&format!("ads_cpc_{i}"))?.unwrap_or(0.0),
                competition: row.optional(&format!("ads_comp_{i}"))?.unwrap_or(0.5),
            });
        }
    }

    Ok(BusinessSignals {
        business_name: row.required_text("business_name")?,
        industry: row.required_text("industry")?,
        zip_code: row.text("zip_code").unwrap_or_default().to_string(),
        operational: OperationalSignals {
            average_rating: row.required("average_rating")?,
            review_count: row.required("review_count")?,
            rating_std_dev: row.optional("rating_std_dev")?.unwrap_or(0.0),
            reviews_last_12m: row.required("reviews_last_12m")?,
            reviews_prior_12m: row.optional("reviews_prior_12m")?,
            current_interest: row.optional("current_interest")?,
            average_interest: row.optional("average_interest")?,
            business_age_years: row.optional("business_age")?.unwrap_or(0.0),
            monthly_review_counts: Vec::new(),
            competitor_density: row.optional("competitor_density")?.unwrap_or(0.5),
            digital_presence: row.optional("digital_presence")?.unwrap_or(0.5),
            cac: row.optional("cac")?,
            average_ticket: row.optional("average_ticket")?,
            gross_margin: None,
        },
        ads,
        popularity_index: row.optional("popularity_index")?,
        median_income: row.optional("median_income")?,
        population: row.optional("population")?,
    })
}

fn summarize(results: &[BatchRowResult], failed: usize) -> BatchSummary {
    let valuations: Vec<f64> = results.iter().map(|r| r.valuation.valuation.valuation.p50).collect();

    let mut grade_distribution = BTreeMap::new();
    for r in results {
        *grade_distribution.entry(r.valuation.operational.grade.clone()).or_insert(0) += 1;
    }

    let mut ranked: Vec<&BatchRowResult> = results.iter().collect();
    ranked.sort_by(|a, b| {
        b.valuation
            .valuation
            .valuation
            .p50
            .total_cmp(&a.valuation.valuation.valuation.p50)
    });
    let top_opportunities = ranked
        .into_iter()
        .take(TOP_OPPORTUNITIES)
        .map(|r| TopOpportunity {
            row: r.row,
            business_name: r.valuation.business_name.clone(),
            p50_valuation: r.valuation.valuation.valuation.p50,
            grade: r.valuation.operational.grade.clone(),
        })
        .collect();

    BatchSummary {
        processed: results.len() + failed,
        succeeded: results.len(),
        failed,
        total_valuation: valuations.iter().sum(),
        mean_valuation: mean(&valuations),
        median_valuation: median(&valuations),
        min_valuation: valuations.iter().copied().reduce(f64::min).unwrap_or(0.0),
        max_valuation: valuations.iter().copied().reduce(f64::max).unwrap_or(0.0),
        grade_distribution,
        top_opportunities,
        high_transition_risk: results
            .iter()
            .filter(|r| r.valuation.transition_risk.score >= HIGH_TRANSITION_RISK)
            .count(),
    }
}

/// Value every row of a CSV document.
///
/// Rows are valued ten at a time; row `i` (0-based) uses seed
/// `base_seed + i`. Row-level problems land in `errors` and never fail the
/// batch; only an unreadable header does.
pub fn process_csv<R: Read>(reader: R, service: &ValuationService, base_seed: u64) -> MarketResult<BatchReport> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: HashMap<String, usize> = csv_reader
        .headers()
        .map_err(|e| MarketError::Csv(e.to_string()))?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase(), i))
        .collect();

    let parsed: Vec<(usize, Result<BusinessSignals, String>)> = csv_reader
        .records()
        .enumerate()
        .map(|(i, record)| {
            let signals = record.map_err(|e| e.to_string()).and_then(|record| {
                parse_signals(&Row {
                    columns: &columns,
                    record: &record,
                })
            });
            (i, signals)
        })
        .collect();

    let mut results = Vec::new();
    let mut errors = Vec::new();

    for chunk in parsed.chunks(CHUNK_SIZE) {
        let outcomes: Vec<(usize, Result<BusinessValuation, BatchRowError>)> = chunk
            .par_iter()
            .map(|(i, signals)| {
                let row = i + 1;
                let outcome = match signals {
                    Ok(signals) => service
                        .valuate(signals, Some(base_seed.wrapping_add(*i as u64)))
                        .map_err(|e| BatchRowError {
                            row,
                            business_name: Some(signals.business_name.clone()),
                            message: e.to_string(),
                        }),
                    Err(message) => Err(BatchRowError {
                        row,
                        business_name: None,
                        message: message.clone(),
                    }),
                };
                (row, outcome)
            })
            .collect();

        for (row, outcome) in outcomes {
            match outcome {
                Ok(valuation) => results.push(BatchRowResult { row, valuation }),
                Err(err) => {
                    warn!(row = err.row, error = %err.message, "Batch row failed");
                    errors.push(err);
                }
            }
        }
    }

    let summary = summarize(&results, errors.len());
    info!(
        processed = summary.processed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Batch valuation complete"
    );
    Ok(BatchReport {
        results,
        errors,
        summary,
    })
}
