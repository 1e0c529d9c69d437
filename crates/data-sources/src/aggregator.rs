use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use market_core::{BusinessObservation, DataSourceProvider, MarketError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

const STREET_ABBREVIATIONS: &[(&str, &str)] = &[
    ("street", "st"),
    ("avenue", "ave"),
    ("road", "rd"),
    ("boulevard", "blvd"),
    ("drive", "dr"),
    ("lane", "ln"),
    ("court", "ct"),
    ("place", "pl"),
    ("suite", "ste"),
    ("north", "n"),
    ("south", "s"),
    ("east", "e"),
    ("west", "w"),
];

/// What one source contributed to an aggregated fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub source: String,
    pub records: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceReport {
    pub sources: Vec<SourceOutcome>,
    pub duplicates_merged: usize,
}

impl SourceReport {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| {
            STREET_ABBREVIATIONS
                .iter()
                .find(|(long, _)| *long == t)
                .map(|(_, short)| *short)
                .unwrap_or(t)
        })
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Normalized (name, address) identity used to merge records across sources.
pub fn dedup_key(business: &BusinessObservation) -> String {
    format!("{}|{}", normalize(&business.name), normalize(&business.address))
}

/// Fans out to every provider concurrently and merges the results.
///
/// A provider that errors or exceeds the timeout contributes nothing; the
/// fetch only fails when every provider does.
pub struct MultiSourceAggregator {
    providers: Vec<Arc<dyn DataSourceProvider>>,
    timeout: Duration,
}

impl MultiSourceAggregator {
    pub fn new(providers: Vec<Arc<dyn DataSourceProvider>>) -> Self {
        Self {
            providers,
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub async fn fetch_with_report(
        &self,
        zip: &str,
        industry: &str,
        limit: usize,
    ) -> Result<(Vec<BusinessObservation>, SourceReport), MarketError> {
        if self.providers.is_empty() {
            return Err(MarketError::SourceUnavailable("no data sources configured".to_string()));
        }

        let fetches = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            async move {
                let name = provider.name().to_string();
                let outcome = match tokio::time::timeout(self.timeout, provider.fetch_businesses(zip, industry, limit)).await {
                    Ok(Ok(records)) => Ok(records),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {:?}", self.timeout)),
                };
                (name, outcome)
            }
        });
        let results = join_all(fetches).await;

        let mut report = SourceReport::default();
        let mut merged: Vec<BusinessObservation> = Vec::new();
        let mut index_by_key: HashMap<String, usize> = HashMap::new();

        for (source, outcome) in results {
            match outcome {
                Ok(records) => {
                    report.sources.push(SourceOutcome {
                        source,
                        records: records.len(),
                        error: None,
                    });
                    for record in records {
                        let key = dedup_key(&record);
                        match index_by_key.get(&key) {
                            Some(&i) => {
                                report.duplicates_merged += 1;
                                if record.data_quality > merged[i].data_quality {
                                    merged[i] = record;
                                }
                            }
                            None => {
                                index_by_key.insert(key, merged.len());
                                merged.push(record);
                            }
                        }
                    }
                }
                Err(error) => {
                    warn!(source = %source, zip, industry, error = %error, "Data source failed; excluding from merge");
                    report.sources.push(SourceOutcome {
                        source,
                        records: 0,
                        error: Some(error),
                    });
                }
            }
        }

        if report.failed_sources() == report.sources.len() {
            let reasons: Vec<String> = report
                .sources
                .iter()
                .map(|s| format!("{}: {}", s.source, s.error.as_deref().unwrap_or("unknown")))
                .collect();
            return Err(MarketError::SourceUnavailable(reasons.join("; ")));
        }

        merged.truncate(limit);
        info!(
            zip,
            industry,
            sources = report.sources.len(),
            failed = report.failed_sources(),
            merged = report.duplicates_merged,
            records = merged.len(),
            "Aggregated business observations"
        );
        Ok((merged, report))
    }
}

#[async_trait]
impl DataSourceProvider for MultiSourceAggregator {
    fn name(&self) -> &str {
        "aggregate"
    }

    async fn fetch_businesses(
        &self,
        zip: &str,
        industry: &str,
        limit: usize,
    ) -> Result<Vec<BusinessObservation>, MarketError> {
        self.fetch_with_report(zip, industry, limit).await.map(|(records, _)| records)
    }
}
