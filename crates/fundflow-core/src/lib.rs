#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fundflow/fundflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and traits for the fundflow aggregation pipeline.
//!
//! This crate provides the foundational abstractions shared by every other
//! fundflow crate:
//!
//! - [`Ticker`](types::Ticker) and the canonical record shapes
//! - [`IngestError`](error::IngestError) - error taxonomy for every stage
//! - [`FundamentalsSource`](source::FundamentalsSource) /
//!   [`PriceSource`](source::PriceSource) - the provider seam
//! - [`FinancialStore`](store::FinancialStore) - the persistence seam
//! - [`normalize`](normalize::normalize) - provider records to canonical rows
//! - [`rolling_average`](growth::rolling_average) - multi-year trend math

/// Error types for ingestion and aggregation.
pub mod error;
/// Rolling multi-year growth calculations.
pub mod growth;
/// Normalization of provider records into canonical rows.
pub mod normalize;
/// Reporting period definitions.
pub mod period;
/// Source traits for fetching provider data.
pub mod source;
/// Store trait for persisting and querying aggregates.
pub mod store;
/// Canonical data types (Ticker, record shapes, run reports).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{IngestError, Result};
pub use growth::{MIN_SAMPLES, rolling_average, year_over_year};
pub use normalize::{finite, normalize};
pub use period::PeriodType;
pub use source::{DataSource, FundamentalsSource, PriceSource};
pub use store::FinancialStore;
pub use types::{
    AnnualFundamentals, CompanyProfile, GroupPerformance, IncomeRow, MetricSet,
    NormalizedFinancialRecord, PriceBar, Quote, RatioSet, RunError, RunOptions, RunReport, Ticker,
    ValuationRecord,
};
