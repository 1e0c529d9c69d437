pub mod config;
pub mod engine;
pub mod recommendations;

pub use config::EngineConfig;
pub use engine::{AnalysisOptions, FragmentationAnalysis, FragmentationEngine};
