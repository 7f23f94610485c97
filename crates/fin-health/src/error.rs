//! Error types for statement retrieval, ratio extraction and prediction.

use thiserror::Error;

/// Result type for fin-health operations.
pub type Result<T> = std::result::Result<T, HealthError>;

/// Errors that can occur while fetching statements, deriving ratios or
/// classifying a company.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The statement provider has no data for this symbol
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// The statement provider failed to return a usable response
    #[error("Provider error for {symbol}: {message}")]
    Provider {
        /// Symbol being fetched
        symbol: String,
        /// Human-readable cause
        message: String,
    },

    /// Statements could not be fetched, so no prediction was attempted
    #[error("Failed to fetch data for {0}")]
    FetchFailed(String),

    /// A statement table is shaped in a way that prevents reading a line item
    #[error("Malformed {statement} statement: line item '{item}' {reason}")]
    MalformedStatement {
        /// Statement kind ("income", "balance", "cash flow")
        statement: String,
        /// Line item being read
        item: String,
        /// What is wrong with it
        reason: String,
    },

    /// A missing metric has no reference mean to substitute
    #[error("Cannot impute {0}: reference table has no values for it")]
    Imputation(String),

    /// The scaler or classifier rejected its input
    #[error("Model error: {0}")]
    Model(String),

    /// Metric name not part of the ratio schema
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}
