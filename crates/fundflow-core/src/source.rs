//! Source traits for fetching provider data.
//!
//! This module defines the seam between the pipeline and external data
//! providers:
//!
//! - [`DataSource`] - base trait for all sources
//! - [`FundamentalsSource`] - profiles, ratios, metrics, quotes, income history
//! - [`PriceSource`] - daily OHLCV bars

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;

use crate::{
    error::Result,
    period::PeriodType,
    types::{CompanyProfile, IncomeRow, MetricSet, PriceBar, Quote, RatioSet, Ticker},
};

/// Base trait for all data sources.
pub trait DataSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g. "FMP").
    fn name(&self) -> &str;

    /// Returns a description of this source.
    fn description(&self) -> &str;
}

/// Source of fundamental data for single tickers.
///
/// One attempt per call; no retry or backoff. Callers tolerate failures by
/// catching and recording them.
#[async_trait]
pub trait FundamentalsSource: DataSource {
    /// Fetches the company profile for a ticker.
    async fn company_profile(&self, ticker: &Ticker) -> Result<CompanyProfile>;

    /// Fetches trailing-twelve-month ratios for a ticker.
    async fn ratios_ttm(&self, ticker: &Ticker) -> Result<RatioSet>;

    /// Fetches trailing-twelve-month key metrics for a ticker.
    async fn key_metrics_ttm(&self, ticker: &Ticker) -> Result<MetricSet>;

    /// Fetches the current quote for a ticker.
    async fn quote(&self, ticker: &Ticker) -> Result<Quote>;

    /// Fetches income statement history, most recent period first.
    async fn income_history(
        &self,
        ticker: &Ticker,
        period: PeriodType,
        limit: Option<usize>,
    ) -> Result<Vec<IncomeRow>>;
}

/// Source of daily price bars.
#[async_trait]
pub trait PriceSource: DataSource {
    /// Fetches daily OHLCV bars for a ticker within a date range.
    async fn daily_prices(
        &self,
        ticker: &Ticker,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceBar>>;
}
