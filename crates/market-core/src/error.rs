use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Insufficient data for zip {zip} / industry {industry}: {reason}")]
    InsufficientData {
        zip: String,
        industry: String,
        reason: String,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("No data source available: {0}")]
    SourceUnavailable(String),

    #[error("Source {source_name} failed: {message}")]
    SourceFailed { source_name: String, message: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

impl MarketError {
    /// Shorthand for the empty-collection case where no (zip, industry) context exists.
    pub fn empty_input(what: &str) -> Self {
        MarketError::InsufficientData {
            zip: String::new(),
            industry: String::new(),
            reason: format!("{what}: no businesses supplied"),
        }
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
