//! In-memory store implementation.

use async_trait::async_trait;
use fundflow_core::{
    AnnualFundamentals, CompanyProfile, FinancialStore, GroupPerformance, IngestError,
    NormalizedFinancialRecord, PriceBar, Result, Ticker, ValuationRecord,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// Map-backed [`FinancialStore`] for tests and development.
///
/// All tables live behind a single [`RwLock`]; upserts replace whole rows,
/// matching the last-write-wins semantics of the SQLite store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    companies: HashMap<Ticker, CompanyProfile>,
    snapshots: HashMap<Ticker, NormalizedFinancialRecord>,
    fundamentals: HashMap<(Ticker, i32), AnnualFundamentals>,
    valuations: HashMap<Ticker, ValuationRecord>,
    sectors: HashMap<String, GroupPerformance>,
    industries: HashMap<String, GroupPerformance>,
    prices: HashMap<(Ticker, chrono::NaiveDate), PriceBar>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|e| IngestError::Store(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|e| IngestError::Store(e.to_string()))
    }

    /// Returns every persisted industry rollup row, ordered by name.
    ///
    /// The SQLite store exposes this through debug tooling only; tests use it
    /// to assert on industry rollups directly.
    pub fn industry_performance(&self) -> Result<Vec<GroupPerformance>> {
        let tables = self.read()?;
        let mut rows: Vec<GroupPerformance> = tables.industries.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    /// Returns the persisted valuation row for a ticker, if any.
    pub fn valuation(&self, ticker: &Ticker) -> Result<Option<ValuationRecord>> {
        let tables = self.read()?;
        Ok(tables.valuations.get(ticker).cloned())
    }
}

#[async_trait]
impl FinancialStore for InMemoryStore {
    async fn list_tickers(&self) -> Result<Vec<Ticker>> {
        let tables = self.read()?;
        let mut tickers: Vec<Ticker> = tables.companies.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    async fn companies(&self) -> Result<Vec<CompanyProfile>> {
        let tables = self.read()?;
        let mut companies: Vec<CompanyProfile> = tables.companies.values().cloned().collect();
        companies.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(companies)
    }

    async fn upsert_company(&self, profile: &CompanyProfile) -> Result<()> {
        let mut tables = self.write()?;
        tables
            .companies
            .insert(profile.ticker.clone(), profile.clone());
        Ok(())
    }

    async fn upsert_snapshot(&self, record: &NormalizedFinancialRecord) -> Result<()> {
        let mut tables = self.write()?;
        tables
            .snapshots
            .insert(record.ticker.clone(), record.clone());
        Ok(())
    }

    async fn snapshot(&self, ticker: &Ticker) -> Result<Option<NormalizedFinancialRecord>> {
        let tables = self.read()?;
        Ok(tables.snapshots.get(ticker).cloned())
    }

    async fn upsert_fundamentals(&self, rows: &[AnnualFundamentals]) -> Result<()> {
        let mut tables = self.write()?;
        for row in rows {
            tables
                .fundamentals
                .insert((row.ticker.clone(), row.fiscal_year), row.clone());
        }
        Ok(())
    }

    async fn fundamentals(&self, ticker: &Ticker) -> Result<Vec<AnnualFundamentals>> {
        let tables = self.read()?;
        let mut rows: Vec<AnnualFundamentals> = tables
            .fundamentals
            .values()
            .filter(|row| &row.ticker == ticker)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.fiscal_year.cmp(&a.fiscal_year));
        Ok(rows)
    }

    async fn upsert_valuation(&self, record: &ValuationRecord) -> Result<()> {
        let mut tables = self.write()?;
        tables
            .valuations
            .insert(record.ticker.clone(), record.clone());
        Ok(())
    }

    async fn upsert_sector_performance(&self, row: &GroupPerformance) -> Result<()> {
        let mut tables = self.write()?;
        tables.sectors.insert(row.name.clone(), row.clone());
        Ok(())
    }

    async fn upsert_industry_performance(&self, row: &GroupPerformance) -> Result<()> {
        let mut tables = self.write()?;
        tables.industries.insert(row.name.clone(), row.clone());
        Ok(())
    }

    async fn sector_performance(&self) -> Result<Vec<GroupPerformance>> {
        let tables = self.read()?;
        let mut rows: Vec<GroupPerformance> = tables.sectors.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn upsert_prices(&self, bars: &[PriceBar]) -> Result<()> {
        let mut tables = self.write()?;
        for bar in bars {
            tables
                .prices
                .insert((bar.ticker.clone(), bar.date), bar.clone());
        }
        Ok(())
    }

    async fn recent_prices(
        &self,
        ticker: &Ticker,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PriceBar>> {
        let tables = self.read()?;
        let mut bars: Vec<PriceBar> = tables
            .prices
            .values()
            .filter(|bar| &bar.ticker == ticker)
            .cloned()
            .collect();
        bars.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(bars.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[tokio::test]
    async fn test_company_upsert_replaces_row() {
        let store = InMemoryStore::new();
        let ticker = Ticker::new("AAPL");

        let first = CompanyProfile::new(ticker.clone(), "Apple", "Tech", "Hardware");
        let second = CompanyProfile::new(ticker.clone(), "Apple Inc.", "Technology", "Hardware");
        store.upsert_company(&first).await.unwrap();
        store.upsert_company(&second).await.unwrap();

        let companies = store.companies().await.unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Apple Inc.");
    }

    #[tokio::test]
    async fn test_prices_newest_first_with_window() {
        let store = InMemoryStore::new();
        let ticker = Ticker::new("AAPL");
        let bars: Vec<PriceBar> = (1..=5)
            .map(|day| PriceBar {
                ticker: ticker.clone(),
                date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: f64::from(day),
                volume: 100.0,
            })
            .collect();
        store.upsert_prices(&bars).await.unwrap();

        let page = store.recent_prices(&ticker, 3, 1).await.unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].close, 4.0);
        assert_eq!(page[2].close, 2.0);
    }

    #[tokio::test]
    async fn test_industry_rollups_sorted_by_name() {
        let store = InMemoryStore::new();
        for name in ["Software", "Banks", "Retail"] {
            store
                .upsert_industry_performance(&GroupPerformance {
                    name: name.to_string(),
                    avg_revenue_growth: Some(0.1),
                    avg_net_income_growth: None,
                    companies: 3,
                    computed_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let rows = store.industry_performance().unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Banks", "Retail", "Software"]);
    }
}
