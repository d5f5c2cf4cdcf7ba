//! Store trait for persisting and querying aggregates.
//!
//! This module defines the [`FinancialStore`] trait, the durable system of
//! record behind every pipeline. All writes are upserts with deterministic
//! last-write-wins semantics at the uniqueness key named per method.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{
        AnnualFundamentals, CompanyProfile, GroupPerformance, NormalizedFinancialRecord, PriceBar,
        Ticker, ValuationRecord,
    },
};

/// Persistent store for normalized records and aggregates.
///
/// Implementations back this with a relational database (SQLite in
/// production) or in-memory maps for tests.
#[async_trait]
pub trait FinancialStore: Send + Sync + Debug {
    /// Returns every persisted ticker, ordered ascending.
    async fn list_tickers(&self) -> Result<Vec<Ticker>>;

    /// Returns every persisted company profile.
    async fn companies(&self) -> Result<Vec<CompanyProfile>>;

    /// Upserts a company profile, keyed by ticker.
    async fn upsert_company(&self, profile: &CompanyProfile) -> Result<()>;

    /// Upserts a normalized snapshot row, keyed by ticker.
    async fn upsert_snapshot(&self, record: &NormalizedFinancialRecord) -> Result<()>;

    /// Returns the persisted snapshot for a ticker, if any.
    async fn snapshot(&self, ticker: &Ticker) -> Result<Option<NormalizedFinancialRecord>>;

    /// Upserts per-fiscal-year fundamentals, keyed by (ticker, fiscal_year).
    async fn upsert_fundamentals(&self, rows: &[AnnualFundamentals]) -> Result<()>;

    /// Returns a ticker's fundamentals ordered by fiscal year descending.
    async fn fundamentals(&self, ticker: &Ticker) -> Result<Vec<AnnualFundamentals>>;

    /// Upserts a valuation row, keyed by ticker.
    async fn upsert_valuation(&self, record: &ValuationRecord) -> Result<()>;

    /// Upserts a sector rollup row, keyed by sector name.
    async fn upsert_sector_performance(&self, row: &GroupPerformance) -> Result<()>;

    /// Upserts an industry rollup row, keyed by industry name.
    async fn upsert_industry_performance(&self, row: &GroupPerformance) -> Result<()>;

    /// Returns every persisted sector rollup row, ordered by name.
    async fn sector_performance(&self) -> Result<Vec<GroupPerformance>>;

    /// Upserts daily price bars, keyed by (ticker, date).
    async fn upsert_prices(&self, bars: &[PriceBar]) -> Result<()>;

    /// Returns a ticker's daily bars, newest first, with pagination.
    async fn recent_prices(
        &self,
        ticker: &Ticker,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PriceBar>>;
}
