use async_trait::async_trait;

use crate::{BusinessObservation, MarketError};

/// Capability to fetch business observations for a (zip, industry) market.
///
/// The fragmentation engine depends only on this trait; simulated and real
/// connectors, and compositions of them, all implement it.
#[async_trait]
pub trait DataSourceProvider: Send + Sync {
    /// Source tag stamped on every record this provider returns
    fn name(&self) -> &str;

    async fn fetch_businesses(
        &self,
        zip: &str,
        industry: &str,
        limit: usize,
    ) -> Result<Vec<BusinessObservation>, MarketError>;
}
