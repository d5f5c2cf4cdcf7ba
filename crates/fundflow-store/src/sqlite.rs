//! SQLite store implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fundflow_core::{
    AnnualFundamentals, CompanyProfile, FinancialStore, GroupPerformance, IngestError,
    NormalizedFinancialRecord, PriceBar, Result, Ticker, ValuationRecord,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// SQLite-backed store for fundflow aggregates.
///
/// The durable system of record: every write is an upsert with
/// last-write-wins semantics at the table's uniqueness key, so overlapping
/// runs resolve deterministically by commit order.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| IngestError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| IngestError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS companies (
                ticker TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                sector TEXT NOT NULL,
                industry TEXT NOT NULL,
                exchange TEXT,
                currency TEXT
            );

            CREATE TABLE IF NOT EXISTS financial_snapshots (
                ticker TEXT PRIMARY KEY,
                sector TEXT NOT NULL,
                industry TEXT NOT NULL,
                pe_ttm REAL,
                debt_to_equity REAL,
                roe REAL,
                roic REAL,
                gross_margin REAL,
                operating_margin REAL,
                source TEXT NOT NULL,
                normalized_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS annual_fundamentals (
                ticker TEXT NOT NULL,
                fiscal_year INTEGER NOT NULL,
                revenue REAL,
                net_income REAL,
                revenue_growth REAL,
                net_income_growth REAL,
                PRIMARY KEY (ticker, fiscal_year)
            );

            CREATE TABLE IF NOT EXISTS valuation (
                ticker TEXT PRIMARY KEY,
                pe_ttm REAL,
                pb REAL,
                ps REAL,
                ev_to_ebitda REAL,
                fcf_yield REAL,
                market_cap REAL,
                computed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sector_performance (
                sector TEXT PRIMARY KEY,
                avg_revenue_growth REAL,
                avg_net_income_growth REAL,
                companies INTEGER NOT NULL,
                computed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS industry_performance (
                industry TEXT PRIMARY KEY,
                avg_revenue_growth REAL,
                avg_net_income_growth REAL,
                companies INTEGER NOT NULL,
                computed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS prices_daily (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                PRIMARY KEY (ticker, date)
            );

            CREATE INDEX IF NOT EXISTS idx_fundamentals_ticker
             ON annual_fundamentals(ticker);
            CREATE INDEX IF NOT EXISTS idx_prices_ticker_date
             ON prices_daily(ticker, date);",
        )
        .map_err(|e| IngestError::Store(e.to_string()))?;

        debug!("SQLite store schema initialized");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| IngestError::Store(e.to_string()))
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| IngestError::Parse(format!("timestamp {s}: {e}")))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| IngestError::Parse(format!("date {s}: {e}")))
}

#[async_trait]
impl FinancialStore for SqliteStore {
    #[instrument(skip(self))]
    async fn list_tickers(&self) -> Result<Vec<Ticker>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT ticker FROM companies ORDER BY ticker ASC")
            .map_err(|e| IngestError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| IngestError::Store(e.to_string()))?;

        let mut tickers = Vec::new();
        for row in rows {
            tickers.push(Ticker::new(
                row.map_err(|e| IngestError::Store(e.to_string()))?,
            ));
        }
        Ok(tickers)
    }

    #[instrument(skip(self))]
    async fn companies(&self) -> Result<Vec<CompanyProfile>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT ticker, name, sector, industry, exchange, currency
                 FROM companies ORDER BY ticker ASC",
            )
            .map_err(|e| IngestError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CompanyProfile {
                    ticker: Ticker::new(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    sector: row.get(2)?,
                    industry: row.get(3)?,
                    exchange: row.get(4)?,
                    currency: row.get(5)?,
                })
            })
            .map_err(|e| IngestError::Store(e.to_string()))?;

        let mut companies = Vec::new();
        for row in rows {
            companies.push(row.map_err(|e| IngestError::Store(e.to_string()))?);
        }
        Ok(companies)
    }

    #[instrument(skip(self, profile), fields(ticker = %profile.ticker))]
    async fn upsert_company(&self, profile: &CompanyProfile) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO companies (ticker, name, sector, industry, exchange, currency)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(ticker) DO UPDATE SET
                name = excluded.name,
                sector = excluded.sector,
                industry = excluded.industry,
                exchange = excluded.exchange,
                currency = excluded.currency",
            params![
                profile.ticker.as_str(),
                profile.name,
                profile.sector,
                profile.industry,
                profile.exchange,
                profile.currency
            ],
        )
        .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(ticker = %record.ticker))]
    async fn upsert_snapshot(&self, record: &NormalizedFinancialRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO financial_snapshots
             (ticker, sector, industry, pe_ttm, debt_to_equity, roe, roic,
              gross_margin, operating_margin, source, normalized_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(ticker) DO UPDATE SET
                sector = excluded.sector,
                industry = excluded.industry,
                pe_ttm = excluded.pe_ttm,
                debt_to_equity = excluded.debt_to_equity,
                roe = excluded.roe,
                roic = excluded.roic,
                gross_margin = excluded.gross_margin,
                operating_margin = excluded.operating_margin,
                source = excluded.source,
                normalized_at = excluded.normalized_at",
            params![
                record.ticker.as_str(),
                record.sector,
                record.industry,
                record.pe_ttm,
                record.debt_to_equity,
                record.roe,
                record.roic,
                record.gross_margin,
                record.operating_margin,
                record.source,
                record.normalized_at.to_rfc3339()
            ],
        )
        .map_err(|e| IngestError::Store(e.to_string()))?;
        debug!("Upserted snapshot");
        Ok(())
    }

    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn snapshot(&self, ticker: &Ticker) -> Result<Option<NormalizedFinancialRecord>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                "SELECT ticker, sector, industry, pe_ttm, debt_to_equity, roe, roic,
                        gross_margin, operating_margin, source, normalized_at
                 FROM financial_snapshots WHERE ticker = ?1",
                params![ticker.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                        row.get::<_, Option<f64>>(6)?,
                        row.get::<_, Option<f64>>(7)?,
                        row.get::<_, Option<f64>>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, String>(10)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| IngestError::Store(e.to_string()))?;

        match result {
            Some((
                ticker,
                sector,
                industry,
                pe_ttm,
                debt_to_equity,
                roe,
                roic,
                gross_margin,
                operating_margin,
                source,
                normalized_at,
            )) => Ok(Some(NormalizedFinancialRecord {
                ticker: Ticker::new(ticker),
                sector,
                industry,
                pe_ttm,
                debt_to_equity,
                roe,
                roic,
                gross_margin,
                operating_margin,
                source,
                normalized_at: parse_timestamp(&normalized_at)?,
            })),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn upsert_fundamentals(&self, rows: &[AnnualFundamentals]) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| IngestError::Store(e.to_string()))?;

        for row in rows {
            tx.execute(
                "INSERT INTO annual_fundamentals
                 (ticker, fiscal_year, revenue, net_income, revenue_growth, net_income_growth)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(ticker, fiscal_year) DO UPDATE SET
                    revenue = excluded.revenue,
                    net_income = excluded.net_income,
                    revenue_growth = excluded.revenue_growth,
                    net_income_growth = excluded.net_income_growth",
                params![
                    row.ticker.as_str(),
                    row.fiscal_year,
                    row.revenue,
                    row.net_income,
                    row.revenue_growth,
                    row.net_income_growth
                ],
            )
            .map_err(|e| IngestError::Store(e.to_string()))?;
        }

        tx.commit().map_err(|e| IngestError::Store(e.to_string()))?;
        debug!("Upserted {} fundamentals rows", rows.len());
        Ok(())
    }

    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn fundamentals(&self, ticker: &Ticker) -> Result<Vec<AnnualFundamentals>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT fiscal_year, revenue, net_income, revenue_growth, net_income_growth
                 FROM annual_fundamentals
                 WHERE ticker = ?1
                 ORDER BY fiscal_year DESC",
            )
            .map_err(|e| IngestError::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params![ticker.as_str()], |row| {
                Ok(AnnualFundamentals {
                    ticker: ticker.clone(),
                    fiscal_year: row.get(0)?,
                    revenue: row.get(1)?,
                    net_income: row.get(2)?,
                    revenue_growth: row.get(3)?,
                    net_income_growth: row.get(4)?,
                })
            })
            .map_err(|e| IngestError::Store(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| IngestError::Store(e.to_string()))?);
        }
        Ok(result)
    }

    #[instrument(skip(self, record), fields(ticker = %record.ticker))]
    async fn upsert_valuation(&self, record: &ValuationRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO valuation
             (ticker, pe_ttm, pb, ps, ev_to_ebitda, fcf_yield, market_cap, computed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(ticker) DO UPDATE SET
                pe_ttm = excluded.pe_ttm,
                pb = excluded.pb,
                ps = excluded.ps,
                ev_to_ebitda = excluded.ev_to_ebitda,
                fcf_yield = excluded.fcf_yield,
                market_cap = excluded.market_cap,
                computed_at = excluded.computed_at",
            params![
                record.ticker.as_str(),
                record.pe_ttm,
                record.pb,
                record.ps,
                record.ev_to_ebitda,
                record.fcf_yield,
                record.market_cap,
                record.computed_at.to_rfc3339()
            ],
        )
        .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self, row), fields(sector = %row.name))]
    async fn upsert_sector_performance(&self, row: &GroupPerformance) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sector_performance
             (sector, avg_revenue_growth, avg_net_income_growth, companies, computed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(sector) DO UPDATE SET
                avg_revenue_growth = excluded.avg_revenue_growth,
                avg_net_income_growth = excluded.avg_net_income_growth,
                companies = excluded.companies,
                computed_at = excluded.computed_at",
            params![
                row.name,
                row.avg_revenue_growth,
                row.avg_net_income_growth,
                row.companies as i64,
                row.computed_at.to_rfc3339()
            ],
        )
        .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self, row), fields(industry = %row.name))]
    async fn upsert_industry_performance(&self, row: &GroupPerformance) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO industry_performance
             (industry, avg_revenue_growth, avg_net_income_growth, companies, computed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(industry) DO UPDATE SET
                avg_revenue_growth = excluded.avg_revenue_growth,
                avg_net_income_growth = excluded.avg_net_income_growth,
                companies = excluded.companies,
                computed_at = excluded.computed_at",
            params![
                row.name,
                row.avg_revenue_growth,
                row.avg_net_income_growth,
                row.companies as i64,
                row.computed_at.to_rfc3339()
            ],
        )
        .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn sector_performance(&self) -> Result<Vec<GroupPerformance>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT sector, avg_revenue_growth, avg_net_income_growth, companies, computed_at
                 FROM sector_performance ORDER BY sector ASC",
            )
            .map_err(|e| IngestError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| IngestError::Store(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            let (name, avg_revenue_growth, avg_net_income_growth, companies, computed_at) =
                row.map_err(|e| IngestError::Store(e.to_string()))?;
            result.push(GroupPerformance {
                name,
                avg_revenue_growth,
                avg_net_income_growth,
                companies: usize::try_from(companies).unwrap_or(0),
                computed_at: parse_timestamp(&computed_at)?,
            });
        }
        Ok(result)
    }

    #[instrument(skip(self, bars), fields(count = bars.len()))]
    async fn upsert_prices(&self, bars: &[PriceBar]) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| IngestError::Store(e.to_string()))?;

        for bar in bars {
            tx.execute(
                "INSERT INTO prices_daily
                 (ticker, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(ticker, date) DO UPDATE SET
                    open = excluded.open,
                    high = excluded.high,
                    low = excluded.low,
                    close = excluded.close,
                    volume = excluded.volume",
                params![
                    bar.ticker.as_str(),
                    bar.date.to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(|e| IngestError::Store(e.to_string()))?;
        }

        tx.commit().map_err(|e| IngestError::Store(e.to_string()))?;
        debug!("Upserted {} price bars", bars.len());
        Ok(())
    }

    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn recent_prices(
        &self,
        ticker: &Ticker,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PriceBar>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM prices_daily
                 WHERE ticker = ?1
                 ORDER BY date DESC
                 LIMIT ?2 OFFSET ?3",
            )
            .map_err(|e| IngestError::Store(e.to_string()))?;
        let rows = stmt
            .query_map(
                params![ticker.as_str(), limit as i64, offset as i64],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, f64>(5)?,
                    ))
                },
            )
            .map_err(|e| IngestError::Store(e.to_string()))?;

        let mut bars = Vec::new();
        for row in rows {
            let (date, open, high, low, close, volume) =
                row.map_err(|e| IngestError::Store(e.to_string()))?;
            bars.push(PriceBar {
                ticker: ticker.clone(),
                date: parse_date(&date)?,
                open,
                high,
                low,
                close,
                volume,
            });
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(ticker: &str, pe: Option<f64>) -> NormalizedFinancialRecord {
        NormalizedFinancialRecord {
            ticker: Ticker::new(ticker),
            sector: "Tech".to_string(),
            industry: "Software".to_string(),
            pe_ttm: pe,
            debt_to_equity: None,
            roe: None,
            roic: Some(0.2),
            gross_margin: None,
            operating_margin: None,
            source: "test".to_string(),
            normalized_at: Utc::now(),
        }
    }

    fn bar(ticker: &Ticker, date: &str, close: f64) -> PriceBar {
        PriceBar {
            ticker: ticker.clone(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        }
    }

    #[tokio::test]
    async fn test_store_initialization() {
        let store = SqliteStore::in_memory();
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_upsert_is_last_write_wins() {
        let store = SqliteStore::in_memory().unwrap();
        let ticker = Ticker::new("AAPL");

        assert!(store.snapshot(&ticker).await.unwrap().is_none());

        store.upsert_snapshot(&record("AAPL", Some(28.5))).await.unwrap();
        store.upsert_snapshot(&record("AAPL", Some(30.0))).await.unwrap();

        let stored = store.snapshot(&ticker).await.unwrap().unwrap();
        assert_eq!(stored.pe_ttm, Some(30.0));
        assert_eq!(stored.roic, Some(0.2));
    }

    #[tokio::test]
    async fn test_ticker_universe_is_ordered() {
        let store = SqliteStore::in_memory().unwrap();
        for t in ["XOM", "AAPL", "MSFT"] {
            let profile =
                CompanyProfile::new(Ticker::new(t), "Name", "Sector", "Industry");
            store.upsert_company(&profile).await.unwrap();
        }

        let tickers = store.list_tickers().await.unwrap();
        assert_eq!(
            tickers,
            vec![Ticker::new("AAPL"), Ticker::new("MSFT"), Ticker::new("XOM")]
        );
    }

    #[tokio::test]
    async fn test_fundamentals_roundtrip_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        let ticker = Ticker::new("AAPL");
        let rows: Vec<AnnualFundamentals> = (2020..=2023)
            .map(|fy| AnnualFundamentals {
                ticker: ticker.clone(),
                fiscal_year: fy,
                revenue: Some(f64::from(fy)),
                net_income: None,
                revenue_growth: Some(0.05),
                net_income_growth: None,
            })
            .collect();
        store.upsert_fundamentals(&rows).await.unwrap();

        let stored = store.fundamentals(&ticker).await.unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[0].fiscal_year, 2023);
        assert_eq!(stored[3].fiscal_year, 2020);
    }

    #[tokio::test]
    async fn test_recent_prices_pagination() {
        let store = SqliteStore::in_memory().unwrap();
        let ticker = Ticker::new("AAPL");
        let bars = vec![
            bar(&ticker, "2024-01-02", 185.0),
            bar(&ticker, "2024-01-03", 186.0),
            bar(&ticker, "2024-01-04", 184.0),
        ];
        store.upsert_prices(&bars).await.unwrap();

        let page = store.recent_prices(&ticker, 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].close, 184.0);
        assert_eq!(page[1].close, 186.0);

        let rest = store.recent_prices(&ticker, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].close, 185.0);
    }

    #[tokio::test]
    async fn test_sector_performance_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let row = GroupPerformance {
            name: "Tech".to_string(),
            avg_revenue_growth: Some(0.12),
            avg_net_income_growth: None,
            companies: 7,
            computed_at: Utc::now(),
        };
        store.upsert_sector_performance(&row).await.unwrap();

        let stored = store.sector_performance().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Tech");
        assert_eq!(stored[0].avg_revenue_growth, Some(0.12));
        assert_eq!(stored[0].companies, 7);
    }
}
