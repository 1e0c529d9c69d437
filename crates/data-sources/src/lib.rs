//! Business-observation providers.
//!
//! `SimulatedProvider` stands in for directory connectors with stable,
//! seeded output; `MultiSourceAggregator` fans out to several providers and
//! merges what they return.

pub mod aggregator;
pub mod simulated;
pub mod static_provider;

pub use aggregator::{dedup_key, MultiSourceAggregator, SourceOutcome, SourceReport};
pub use simulated::SimulatedProvider;
pub use static_provider::StaticProvider;
