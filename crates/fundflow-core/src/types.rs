//! Canonical data types for the aggregation pipeline.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Ticker`] - exchange symbol identifying a security
//! - [`CompanyProfile`], [`RatioSet`], [`MetricSet`], [`Quote`], [`IncomeRow`] -
//!   schema-checked intermediate records parsed per provider endpoint
//! - [`NormalizedFinancialRecord`] - the canonical per-ticker snapshot row
//! - [`AnnualFundamentals`] - per-fiscal-year rows feeding the rollups
//! - [`GroupPerformance`], [`ValuationRecord`], [`PriceBar`] - aggregate rows
//! - [`RunOptions`], [`RunReport`] - pipeline invocation and its summary

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An exchange symbol identifying a tradable security.
///
/// Tickers are trimmed and uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker from a string, trimming and uppercasing it.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the ticker is empty after trimming.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ticker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Company reference information from the provider's profile endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Stock ticker.
    pub ticker: Ticker,
    /// Company name.
    pub name: String,
    /// Business sector.
    pub sector: String,
    /// Industry within the sector.
    pub industry: String,
    /// Primary exchange.
    pub exchange: Option<String>,
    /// Trading currency.
    pub currency: Option<String>,
}

impl CompanyProfile {
    /// Creates a new profile with the required fields.
    #[must_use]
    pub fn new(
        ticker: Ticker,
        name: impl Into<String>,
        sector: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            ticker,
            name: name.into(),
            sector: sector.into(),
            industry: industry.into(),
            exchange: None,
            currency: None,
        }
    }
}

/// Trailing-twelve-month financial ratios for one ticker.
///
/// Every field is optional; absent or non-finite source values stay `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    /// Price-to-earnings ratio (TTM).
    pub pe_ttm: Option<f64>,
    /// Debt-to-equity ratio.
    pub debt_to_equity: Option<f64>,
    /// Return on equity.
    pub roe: Option<f64>,
    /// Gross profit margin.
    pub gross_margin: Option<f64>,
    /// Operating profit margin.
    pub operating_margin: Option<f64>,
}

/// Trailing-twelve-month key metrics for one ticker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// Return on invested capital.
    pub roic: Option<f64>,
    /// Return on equity, where the provider reports it here instead.
    pub roe: Option<f64>,
    /// Debt-to-equity ratio, where the provider reports it here instead.
    pub debt_to_equity: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Price-to-book ratio.
    pub pb: Option<f64>,
    /// Price-to-sales ratio.
    pub ps: Option<f64>,
    /// EV/EBITDA ratio.
    pub ev_to_ebitda: Option<f64>,
    /// Free-cash-flow yield.
    pub fcf_yield: Option<f64>,
}

/// A point-in-time quote for one ticker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Last traded price.
    pub price: Option<f64>,
    /// Price-to-earnings ratio as reported on the quote.
    pub pe: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
}

/// One fiscal-year income statement row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeRow {
    /// Fiscal year the row covers.
    pub fiscal_year: i32,
    /// Total revenue.
    pub revenue: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
}

/// The canonical normalized snapshot for one ticker.
///
/// Produced by [`normalize`](crate::normalize::normalize) and upserted into
/// the store keyed by ticker. All numeric fields are nullable; absent or
/// non-finite source values map to `None`, never to zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFinancialRecord {
    /// Stock ticker.
    pub ticker: Ticker,
    /// Business sector from the profile.
    pub sector: String,
    /// Industry from the profile.
    pub industry: String,
    /// Price-to-earnings ratio (TTM).
    pub pe_ttm: Option<f64>,
    /// Debt-to-equity ratio.
    pub debt_to_equity: Option<f64>,
    /// Return on equity.
    pub roe: Option<f64>,
    /// Return on invested capital.
    pub roic: Option<f64>,
    /// Gross profit margin.
    pub gross_margin: Option<f64>,
    /// Operating profit margin.
    pub operating_margin: Option<f64>,
    /// Which source produced the inputs (e.g. "FMP", "fmp-bulk").
    pub source: String,
    /// When normalization ran.
    pub normalized_at: DateTime<Utc>,
}

/// Per-fiscal-year fundamentals persisted for the rollup aggregators.
///
/// The growth columns are year-over-year changes computed at ingest time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnualFundamentals {
    /// Stock ticker.
    pub ticker: Ticker,
    /// Fiscal year the row covers.
    pub fiscal_year: i32,
    /// Total revenue.
    pub revenue: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
    /// Revenue change versus the prior fiscal year.
    pub revenue_growth: Option<f64>,
    /// Net-income change versus the prior fiscal year.
    pub net_income_growth: Option<f64>,
}

/// One aggregate row per sector or industry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupPerformance {
    /// Sector or industry name.
    pub name: String,
    /// Mean rolling revenue growth across the group's companies.
    pub avg_revenue_growth: Option<f64>,
    /// Mean rolling net-income growth across the group's companies.
    pub avg_net_income_growth: Option<f64>,
    /// Number of companies that contributed a qualifying figure.
    pub companies: usize,
    /// When the rollup ran.
    pub computed_at: DateTime<Utc>,
}

/// Valuation snapshot for one ticker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValuationRecord {
    /// Stock ticker.
    pub ticker: Ticker,
    /// Price-to-earnings ratio (TTM).
    pub pe_ttm: Option<f64>,
    /// Price-to-book ratio.
    pub pb: Option<f64>,
    /// Price-to-sales ratio.
    pub ps: Option<f64>,
    /// EV/EBITDA ratio.
    pub ev_to_ebitda: Option<f64>,
    /// Free-cash-flow yield.
    pub fcf_yield: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// When the valuation ran.
    pub computed_at: DateTime<Utc>,
}

/// One daily OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Stock ticker.
    pub ticker: Ticker,
    /// Trading date.
    pub date: NaiveDate,
    /// Opening price.
    pub open: f64,
    /// Highest price of the day.
    pub high: f64,
    /// Lowest price of the day.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Trading volume.
    pub volume: f64,
}

/// Caller-supplied options for one aggregation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunOptions {
    /// Restrict the run to a single ticker.
    pub ticker: Option<Ticker>,
    /// Process at most this many tickers.
    pub limit: Option<usize>,
    /// Skip this many tickers before processing.
    pub offset: Option<usize>,
}

impl RunOptions {
    /// Options targeting a single ticker.
    #[must_use]
    pub fn for_ticker(ticker: Ticker) -> Self {
        Self {
            ticker: Some(ticker),
            ..Self::default()
        }
    }
}

/// A per-item failure recorded during an aggregation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    /// Ticker (or group name) the failure belongs to.
    pub ticker: String,
    /// Human-readable failure message.
    pub message: String,
}

/// Summary of one aggregation run, returned to the caller and never persisted.
///
/// `success` reflects whether the run itself completed; it is independent of
/// individual item failures, which are listed in `errors`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Whether the run completed.
    pub success: bool,
    /// Number of items processed successfully.
    #[serde(rename = "processed_count")]
    pub processed: usize,
    /// Number of items that failed.
    #[serde(rename = "error_count")]
    pub failed: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
    /// Per-item failures, in processing order.
    pub errors: Vec<RunError>,
}

impl RunReport {
    /// Builds a completed report from the run's tallies.
    #[must_use]
    pub fn completed(processed: usize, errors: Vec<RunError>, duration_ms: u64) -> Self {
        Self {
            success: true,
            processed,
            failed: errors.len(),
            duration_ms,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_is_uppercased_and_trimmed() {
        assert_eq!(Ticker::new(" aapl ").as_str(), "AAPL");
        assert_eq!(Ticker::new("BRK.B").as_str(), "BRK.B");
        assert!(Ticker::new("  ").is_empty());
    }

    #[test]
    fn run_report_counts_follow_errors() {
        let errors = vec![RunError {
            ticker: "XYZ".to_string(),
            message: "boom".to_string(),
        }];
        let report = RunReport::completed(4, errors, 12);
        assert!(report.success);
        assert_eq!(report.processed, 4);
        assert_eq!(report.failed, 1);
    }
}
