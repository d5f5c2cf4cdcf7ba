//! Pipeline runs over sources, the bulk snapshot, and the store.

use chrono::{Duration, Utc};
use fundflow_bulk::{BulkLoader, BulkTables};
use fundflow_core::{
    AnnualFundamentals, FinancialStore, FundamentalsSource, GroupPerformance, IncomeRow,
    IngestError, PriceSource, Result, RunError, RunOptions, RunReport, Ticker, ValuationRecord,
    finite, normalize, rolling_average, year_over_year,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Source label stamped on snapshot rows derived from the bulk exports.
const BULK_SOURCE: &str = "fmp-bulk";

/// Rolling window, in fiscal years, for the sector and industry rollups.
const GROWTH_WINDOW_YEARS: usize = 5;

/// How far back the price run fetches daily bars.
const PRICE_LOOKBACK_DAYS: i64 = 30;

/// The aggregation pipeline runner.
///
/// Each `run_*` method executes one pipeline end to end and returns a
/// [`RunReport`]. A failing universe lookup (bulk snapshot, persisted ticker
/// list, companies) is fatal and surfaces as `Err`; per-item failures are
/// recorded in the report's `errors` and never abort the run.
#[derive(Debug)]
pub struct Aggregator {
    source: Arc<dyn FundamentalsSource>,
    price_source: Arc<dyn PriceSource>,
    bulk: Arc<BulkLoader>,
    store: Arc<dyn FinancialStore>,
}

impl Aggregator {
    /// Creates an aggregator over the given seams.
    #[must_use]
    pub fn new(
        source: Arc<dyn FundamentalsSource>,
        price_source: Arc<dyn PriceSource>,
        bulk: Arc<BulkLoader>,
        store: Arc<dyn FinancialStore>,
    ) -> Self {
        Self {
            source,
            price_source,
            bulk,
            store,
        }
    }

    /// Ingests the bulk snapshot into the store.
    ///
    /// The universe is the requested ticker, or every ticker in the bulk
    /// profile table. Per ticker: normalize the snapshot's profile, ratios,
    /// and metrics into a canonical row, upsert the company and snapshot,
    /// then derive per-fiscal-year fundamentals (with year-over-year growth)
    /// from the income table.
    pub async fn run_bulk_update(&self, opts: &RunOptions) -> Result<RunReport> {
        let started = Instant::now();
        let tables = self.bulk.tables().await?;

        let universe = match &opts.ticker {
            Some(ticker) => vec![ticker.clone()],
            None => tables.tickers(),
        };
        let universe = apply_window(universe, opts);
        info!(tickers = universe.len(), "Starting bulk update run");

        let mut processed = 0;
        let mut errors = Vec::new();
        for ticker in &universe {
            match self.ingest_bulk_ticker(&tables, ticker).await {
                Ok(()) => processed += 1,
                Err(e) => {
                    warn!(%ticker, error = %e, "Bulk ingest failed");
                    errors.push(RunError {
                        ticker: ticker.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(RunReport::completed(processed, errors, elapsed_ms(started)))
    }

    async fn ingest_bulk_ticker(&self, tables: &BulkTables, ticker: &Ticker) -> Result<()> {
        let profile = tables.profile(ticker).ok_or_else(|| {
            IngestError::IncompleteData {
                ticker: ticker.to_string(),
                missing: "profile".to_string(),
            }
        })?;
        let ratios = tables.ratio_set(ticker);
        let metrics = tables.metric_set(ticker);

        let record = normalize(
            ticker,
            Some(&profile),
            ratios.as_ref(),
            metrics.as_ref(),
            None,
            BULK_SOURCE,
        )
        .ok_or_else(|| {
            let missing = if ratios.is_none() { "ratios" } else { "key metrics" };
            IngestError::IncompleteData {
                ticker: ticker.to_string(),
                missing: missing.to_string(),
            }
        })?;

        self.store.upsert_company(&profile).await?;
        self.store.upsert_snapshot(&record).await?;

        let fundamentals = derive_fundamentals(ticker, tables.income_rows(ticker));
        if !fundamentals.is_empty() {
            self.store.upsert_fundamentals(&fundamentals).await?;
        }
        Ok(())
    }

    /// Refreshes valuation rows from the live source.
    ///
    /// The universe is the requested ticker, or the persisted ticker list.
    /// Key metrics are required per ticker; the quote only supplies
    /// fallbacks and its failure is tolerated.
    pub async fn run_valuation(&self, opts: &RunOptions) -> Result<RunReport> {
        let started = Instant::now();
        let universe = match &opts.ticker {
            Some(ticker) => vec![ticker.clone()],
            None => self.store.list_tickers().await?,
        };
        let universe = apply_window(universe, opts);
        info!(tickers = universe.len(), "Starting valuation run");

        let mut processed = 0;
        let mut errors = Vec::new();
        for ticker in &universe {
            match self.value_ticker(ticker).await {
                Ok(()) => processed += 1,
                Err(e) => {
                    warn!(%ticker, error = %e, "Valuation failed");
                    errors.push(RunError {
                        ticker: ticker.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(RunReport::completed(processed, errors, elapsed_ms(started)))
    }

    async fn value_ticker(&self, ticker: &Ticker) -> Result<()> {
        let metrics = self.source.key_metrics_ttm(ticker).await?;
        let quote = self.source.quote(ticker).await.ok();

        let record = ValuationRecord {
            ticker: ticker.clone(),
            pe_ttm: finite(quote.and_then(|q| q.pe)),
            pb: finite(metrics.pb),
            ps: finite(metrics.ps),
            ev_to_ebitda: finite(metrics.ev_to_ebitda),
            fcf_yield: finite(metrics.fcf_yield),
            market_cap: finite(metrics.market_cap)
                .or_else(|| finite(quote.and_then(|q| q.market_cap))),
            computed_at: Utc::now(),
        };
        self.store.upsert_valuation(&record).await
    }

    /// Refreshes recent daily price bars from the price source.
    pub async fn run_price_update(&self, opts: &RunOptions) -> Result<RunReport> {
        let started = Instant::now();
        let universe = match &opts.ticker {
            Some(ticker) => vec![ticker.clone()],
            None => self.store.list_tickers().await?,
        };
        let universe = apply_window(universe, opts);
        info!(tickers = universe.len(), "Starting price update run");

        let mut processed = 0;
        let mut errors = Vec::new();
        for ticker in &universe {
            match self.refresh_prices(ticker).await {
                Ok(bars) => {
                    processed += 1;
                    info!(%ticker, bars, "Stored daily bars");
                }
                Err(e) => {
                    warn!(%ticker, error = %e, "Price update failed");
                    errors.push(RunError {
                        ticker: ticker.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(RunReport::completed(processed, errors, elapsed_ms(started)))
    }

    async fn refresh_prices(&self, ticker: &Ticker) -> Result<usize> {
        let to = Utc::now().date_naive();
        let from = to - Duration::days(PRICE_LOOKBACK_DAYS);
        let bars = self.price_source.daily_prices(ticker, from, to).await?;
        if bars.is_empty() {
            return Err(IngestError::IncompleteData {
                ticker: ticker.to_string(),
                missing: "daily prices".to_string(),
            });
        }
        self.store.upsert_prices(&bars).await?;
        Ok(bars.len())
    }

    /// Recomputes the per-sector rollup from persisted fundamentals.
    pub async fn run_sector_performance(&self) -> Result<RunReport> {
        self.run_rollup(GroupKind::Sector).await
    }

    /// Recomputes the per-industry rollup from persisted fundamentals.
    pub async fn run_industry_performance(&self) -> Result<RunReport> {
        self.run_rollup(GroupKind::Industry).await
    }

    async fn run_rollup(&self, kind: GroupKind) -> Result<RunReport> {
        let started = Instant::now();
        let companies = self.store.companies().await?;

        let mut groups: BTreeMap<String, Vec<Ticker>> = BTreeMap::new();
        for company in &companies {
            let key = match kind {
                GroupKind::Sector => company.sector.trim(),
                GroupKind::Industry => company.industry.trim(),
            };
            if key.is_empty() {
                continue;
            }
            groups
                .entry(key.to_string())
                .or_default()
                .push(company.ticker.clone());
        }
        info!(kind = kind.label(), groups = groups.len(), "Starting rollup run");

        let mut processed = 0;
        let mut errors = Vec::new();
        for (name, tickers) in &groups {
            match self.rollup_group(kind, name, tickers).await {
                Ok(()) => processed += 1,
                Err(e) => {
                    warn!(group = %name, error = %e, "Rollup failed");
                    errors.push(RunError {
                        ticker: name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(RunReport::completed(processed, errors, elapsed_ms(started)))
    }

    async fn rollup_group(&self, kind: GroupKind, name: &str, tickers: &[Ticker]) -> Result<()> {
        let mut revenue_figures = Vec::new();
        let mut income_figures = Vec::new();
        let mut contributing = 0;

        for ticker in tickers {
            let rows = self.store.fundamentals(ticker).await?;
            let revenue = rolling_average(
                &rows,
                |r| r.fiscal_year,
                |r| r.revenue_growth,
                GROWTH_WINDOW_YEARS,
            );
            let income = rolling_average(
                &rows,
                |r| r.fiscal_year,
                |r| r.net_income_growth,
                GROWTH_WINDOW_YEARS,
            );
            if revenue.is_some() || income.is_some() {
                contributing += 1;
            }
            revenue_figures.extend(revenue);
            income_figures.extend(income);
        }

        let row = GroupPerformance {
            name: name.to_string(),
            avg_revenue_growth: mean(&revenue_figures),
            avg_net_income_growth: mean(&income_figures),
            companies: contributing,
            computed_at: Utc::now(),
        };
        match kind {
            GroupKind::Sector => self.store.upsert_sector_performance(&row).await,
            GroupKind::Industry => self.store.upsert_industry_performance(&row).await,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum GroupKind {
    Sector,
    Industry,
}

impl GroupKind {
    fn label(self) -> &'static str {
        match self {
            Self::Sector => "sector",
            Self::Industry => "industry",
        }
    }
}

/// Dedupe the universe and slice it to the requested window.
fn apply_window(mut tickers: Vec<Ticker>, opts: &RunOptions) -> Vec<Ticker> {
    tickers.retain(|t| !t.is_empty());
    tickers.sort();
    tickers.dedup();

    let offset = opts.offset.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX);
    tickers.into_iter().skip(offset).take(limit).collect()
}

/// Sort income rows ascending and attach year-over-year growth columns.
fn derive_fundamentals(ticker: &Ticker, mut rows: Vec<IncomeRow>) -> Vec<AnnualFundamentals> {
    rows.sort_by_key(|r| r.fiscal_year);
    rows.dedup_by_key(|r| r.fiscal_year);

    let mut out = Vec::with_capacity(rows.len());
    let mut previous: Option<IncomeRow> = None;
    for row in rows {
        out.push(AnnualFundamentals {
            ticker: ticker.clone(),
            fiscal_year: row.fiscal_year,
            revenue: finite(row.revenue),
            net_income: finite(row.net_income),
            revenue_growth: previous
                .and_then(|prev| year_over_year(prev.revenue, row.revenue)),
            net_income_growth: previous
                .and_then(|prev| year_over_year(prev.net_income, row.net_income)),
        });
        previous = Some(row);
    }
    out
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    mean.is_finite().then_some(mean)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use fundflow_core::{
        CompanyProfile, DataSource, MetricSet, PeriodType, PriceBar, Quote, RatioSet,
    };
    use fundflow_store::InMemoryStore;
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::Write as _;
    use std::path::Path;

    #[derive(Debug, Default)]
    struct MockSource {
        metrics: HashMap<Ticker, MetricSet>,
        quotes: HashMap<Ticker, Quote>,
        bars: HashMap<Ticker, Vec<PriceBar>>,
    }

    impl DataSource for MockSource {
        fn name(&self) -> &str {
            "mock"
        }

        fn description(&self) -> &str {
            "in-memory fixture source"
        }
    }

    #[async_trait]
    impl FundamentalsSource for MockSource {
        async fn company_profile(&self, ticker: &Ticker) -> Result<CompanyProfile> {
            Err(IngestError::TickerNotFound(ticker.to_string()))
        }

        async fn ratios_ttm(&self, ticker: &Ticker) -> Result<RatioSet> {
            Err(IngestError::TickerNotFound(ticker.to_string()))
        }

        async fn key_metrics_ttm(&self, ticker: &Ticker) -> Result<MetricSet> {
            self.metrics
                .get(ticker)
                .copied()
                .ok_or_else(|| IngestError::TickerNotFound(ticker.to_string()))
        }

        async fn quote(&self, ticker: &Ticker) -> Result<Quote> {
            self.quotes
                .get(ticker)
                .copied()
                .ok_or_else(|| IngestError::TickerNotFound(ticker.to_string()))
        }

        async fn income_history(
            &self,
            _ticker: &Ticker,
            _period: PeriodType,
            _limit: Option<usize>,
        ) -> Result<Vec<IncomeRow>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl PriceSource for MockSource {
        async fn daily_prices(
            &self,
            ticker: &Ticker,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<PriceBar>> {
            Ok(self.bars.get(ticker).cloned().unwrap_or_default())
        }
    }

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn aggregator(
        source: MockSource,
        bulk_dir: &Path,
        store: Arc<InMemoryStore>,
    ) -> Aggregator {
        let source = Arc::new(source);
        Aggregator::new(
            source.clone(),
            source,
            Arc::new(BulkLoader::new(bulk_dir)),
            store,
        )
    }

    fn bar(ticker: &Ticker, day: u32) -> PriceBar {
        PriceBar {
            ticker: ticker.clone(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 100.0,
        }
    }

    fn growth_rows(ticker: &Ticker, years: std::ops::RangeInclusive<i32>) -> Vec<AnnualFundamentals> {
        years
            .map(|fy| AnnualFundamentals {
                ticker: ticker.clone(),
                fiscal_year: fy,
                revenue: Some(100.0),
                net_income: Some(10.0),
                revenue_growth: Some(0.1),
                net_income_growth: Some(0.05),
            })
            .collect()
    }

    #[tokio::test]
    async fn bulk_run_records_partial_failures() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "profiles.csv",
            "symbol,companyName,sector,industry\n\
             AAPL,Apple Inc.,Tech,Consumer Electronics\n\
             XOM,Exxon Mobil,Energy,Oil & Gas\n",
        );
        // Only AAPL has ratios and metrics rows; XOM stays incomplete.
        write_file(tmp.path(), "ratios.csv", "symbol,peRatioTTM\nAAPL,28.5\n");
        write_file(tmp.path(), "metrics.csv", "symbol,roicTTM\nAAPL,0.22\n");
        write_file(
            tmp.path(),
            "income_2022.csv",
            "symbol,revenue,netIncome\nAAPL,100,10\n",
        );
        write_file(
            tmp.path(),
            "income_2023.csv",
            "symbol,revenue,netIncome\nAAPL,110,12\n",
        );

        let store = Arc::new(InMemoryStore::new());
        let agg = aggregator(MockSource::default(), tmp.path(), store.clone());

        let report = agg.run_bulk_update(&RunOptions::default()).await.unwrap();
        assert!(report.success);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].ticker, "XOM");

        let aapl = Ticker::new("AAPL");
        let snapshot = store.snapshot(&aapl).await.unwrap().unwrap();
        assert_eq!(snapshot.pe_ttm, Some(28.5));
        assert_eq!(snapshot.roic, Some(0.22));
        assert_eq!(snapshot.source, "fmp-bulk");

        let fundamentals = store.fundamentals(&aapl).await.unwrap();
        assert_eq!(fundamentals.len(), 2);
        assert_eq!(fundamentals[0].fiscal_year, 2023);
        let growth = fundamentals[0].revenue_growth.unwrap();
        assert!((growth - 0.1).abs() < 1e-9);
        assert_eq!(fundamentals[1].revenue_growth, None);
    }

    #[tokio::test]
    async fn bulk_run_window_slices_the_universe() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "profiles.csv",
            "symbol,companyName,sector,industry\n\
             A,A Co,Tech,Software\n\
             B,B Co,Tech,Software\n\
             C,C Co,Tech,Software\n\
             D,D Co,Tech,Software\n",
        );
        write_file(
            tmp.path(),
            "ratios.csv",
            "symbol,peRatioTTM\nA,1\nB,2\nC,3\nD,4\n",
        );
        write_file(
            tmp.path(),
            "metrics.csv",
            "symbol,roicTTM\nA,0.1\nB,0.2\nC,0.3\nD,0.4\n",
        );

        let store = Arc::new(InMemoryStore::new());
        let agg = aggregator(MockSource::default(), tmp.path(), store.clone());

        let opts = RunOptions {
            ticker: None,
            limit: Some(2),
            offset: Some(1),
        };
        let report = agg.run_bulk_update(&opts).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 0);

        let stored = store.list_tickers().await.unwrap();
        assert_eq!(stored, vec![Ticker::new("B"), Ticker::new("C")]);
    }

    #[tokio::test]
    async fn valuation_run_tolerates_a_missing_quote() {
        let store = Arc::new(InMemoryStore::new());
        let aapl = Ticker::new("AAPL");
        let xyz = Ticker::new("XYZ");
        for t in [&aapl, &xyz] {
            store
                .upsert_company(&CompanyProfile::new(t.clone(), "Co", "Tech", "Software"))
                .await
                .unwrap();
        }

        let mut source = MockSource::default();
        source.metrics.insert(
            aapl.clone(),
            MetricSet {
                pb: Some(45.0),
                market_cap: Some(3.0e12),
                ..Default::default()
            },
        );
        // No quote fixture: pe_ttm stays None, metrics still produce a row.

        let tmp = tempfile::tempdir().unwrap();
        let agg = aggregator(source, tmp.path(), store.clone());

        let report = agg.run_valuation(&RunOptions::default()).await.unwrap();
        assert!(report.success);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].ticker, "XYZ");

        let valuation = store.valuation(&aapl).unwrap().unwrap();
        assert_eq!(valuation.pb, Some(45.0));
        assert_eq!(valuation.market_cap, Some(3.0e12));
        assert_eq!(valuation.pe_ttm, None);
    }

    #[tokio::test]
    async fn price_run_flags_empty_history() {
        let store = Arc::new(InMemoryStore::new());
        let aapl = Ticker::new("AAPL");
        let xyz = Ticker::new("XYZ");
        for t in [&aapl, &xyz] {
            store
                .upsert_company(&CompanyProfile::new(t.clone(), "Co", "Tech", "Software"))
                .await
                .unwrap();
        }

        let mut source = MockSource::default();
        source.bars.insert(aapl.clone(), vec![bar(&aapl, 2), bar(&aapl, 3)]);

        let tmp = tempfile::tempdir().unwrap();
        let agg = aggregator(source, tmp.path(), store.clone());

        let report = agg.run_price_update(&RunOptions::default()).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].ticker, "XYZ");

        let bars = store.recent_prices(&aapl, 10, 0).await.unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[tokio::test]
    async fn sector_rollup_requires_minimum_samples() {
        let store = Arc::new(InMemoryStore::new());
        let aapl = Ticker::new("AAPL");
        let msft = Ticker::new("MSFT");
        let xom = Ticker::new("XOM");

        for (t, sector) in [(&aapl, "Tech"), (&msft, "Tech"), (&xom, "Energy")] {
            store
                .upsert_company(&CompanyProfile::new(t.clone(), "Co", sector, "Industry"))
                .await
                .unwrap();
        }
        // AAPL qualifies with four growth years; MSFT's two fall below the
        // minimum; XOM has no fundamentals at all.
        store
            .upsert_fundamentals(&growth_rows(&aapl, 2020..=2023))
            .await
            .unwrap();
        store
            .upsert_fundamentals(&growth_rows(&msft, 2022..=2023))
            .await
            .unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let agg = aggregator(MockSource::default(), tmp.path(), store.clone());

        let report = agg.run_sector_performance().await.unwrap();
        assert!(report.success);
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 0);

        let rows = store.sector_performance().await.unwrap();
        assert_eq!(rows.len(), 2);

        let energy = &rows[0];
        assert_eq!(energy.name, "Energy");
        assert_eq!(energy.companies, 0);
        assert_eq!(energy.avg_revenue_growth, None);

        let tech = &rows[1];
        assert_eq!(tech.name, "Tech");
        assert_eq!(tech.companies, 1);
        let avg = tech.avg_revenue_growth.unwrap();
        assert!((avg - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn industry_rollup_groups_by_industry() {
        let store = Arc::new(InMemoryStore::new());
        let aapl = Ticker::new("AAPL");
        store
            .upsert_company(&CompanyProfile::new(
                aapl.clone(),
                "Apple Inc.",
                "Tech",
                "Consumer Electronics",
            ))
            .await
            .unwrap();
        store
            .upsert_fundamentals(&growth_rows(&aapl, 2019..=2023))
            .await
            .unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let agg = aggregator(MockSource::default(), tmp.path(), store.clone());

        let report = agg.run_industry_performance().await.unwrap();
        assert_eq!(report.processed, 1);

        let rows = store.industry_performance().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Consumer Electronics");
        assert_eq!(rows[0].companies, 1);
    }

    #[test]
    fn window_dedupes_and_slices() {
        let tickers = vec![
            Ticker::new("B"),
            Ticker::new("A"),
            Ticker::new("B"),
            Ticker::new(" "),
            Ticker::new("C"),
        ];
        let opts = RunOptions {
            ticker: None,
            limit: Some(2),
            offset: Some(1),
        };
        assert_eq!(
            apply_window(tickers, &opts),
            vec![Ticker::new("B"), Ticker::new("C")]
        );
    }

    #[test]
    fn derived_fundamentals_carry_growth_columns() {
        let ticker = Ticker::new("AAPL");
        let rows = vec![
            IncomeRow {
                fiscal_year: 2023,
                revenue: Some(120.0),
                net_income: Some(0.0),
            },
            IncomeRow {
                fiscal_year: 2022,
                revenue: Some(100.0),
                net_income: Some(10.0),
            },
        ];

        let out = derive_fundamentals(&ticker, rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].fiscal_year, 2022);
        assert_eq!(out[0].revenue_growth, None);
        let growth = out[1].revenue_growth.unwrap();
        assert!((growth - 0.2).abs() < 1e-9);
        // Net income dropped to zero: a -100% change, not a null.
        assert_eq!(out[1].net_income_growth, Some(-1.0));
    }
}
