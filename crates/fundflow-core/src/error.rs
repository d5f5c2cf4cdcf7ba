//! Error types for ingestion and aggregation.
//!
//! This module defines [`IngestError`] which covers all error cases that can
//! occur while fetching, normalizing, or persisting financial data.

use thiserror::Error;

/// Errors that can occur during ingestion and aggregation.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Network-related errors (connection failures, non-2xx responses).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested ticker was not found at the source.
    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    /// Required source data is missing, so the item is excluded.
    #[error("Incomplete source data for {ticker}: missing {missing}")]
    IncompleteData {
        /// The ticker that could not be normalized.
        ticker: String,
        /// Which required input was absent.
        missing: String,
    },

    /// Error parsing data from a provider or bulk export.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error reading from or writing to the persistent store.
    #[error("Store error: {0}")]
    Store(String),

    /// Missing or invalid process configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An invalid parameter was provided by the caller.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`IngestError`].
pub type Result<T> = std::result::Result<T, IngestError>;
