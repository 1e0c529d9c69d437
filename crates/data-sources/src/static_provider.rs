use async_trait::async_trait;
use market_core::{BusinessObservation, DataSourceProvider, MarketError};

/// Serves a fixed set of pre-fetched observations, filtered by market.
pub struct StaticProvider {
    name: String,
    businesses: Vec<BusinessObservation>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>, businesses: Vec<BusinessObservation>) -> Self {
        Self {
            name: name.into(),
            businesses,
        }
    }
}

#[async_trait]
impl DataSourceProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_businesses(
        &self,
        zip: &str,
        industry: &str,
        limit: usize,
    ) -> Result<Vec<BusinessObservation>, MarketError> {
        Ok(self
            .businesses
            .iter()
            .filter(|b| b.zip_code == zip.trim() && b.industry.eq_ignore_ascii_case(industry.trim()))
            .take(limit)
            .cloned()
            .collect())
    }
}
