#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fundflow/fundflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Bulk snapshot loader.
//!
//! Provider bulk exports are multi-megabyte CSVs; re-parsing them on every
//! request would be prohibitively slow, so [`BulkLoader`] parses them once
//! per process lifetime behind a guarded one-time initialization and hands
//! out the same [`BulkTables`] reference thereafter. The flip side is a
//! known staleness window: data loaded at first use persists until process
//! restart, with no invalidation hook.
//!
//! Expected directory layout:
//!
//! ```text
//! bulk/
//!   profiles.csv          (required)
//!   ratios.csv
//!   metrics.csv
//!   income_2021.csv       (one statement file per fiscal year)
//!   income_2022.csv
//!   balance_2022.csv
//!   cashflow_2022.csv
//! ```

use fundflow_core::{
    CompanyProfile, IncomeRow, IngestError, MetricSet, RatioSet, Result, Ticker, finite,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// One row of `profiles.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkProfileRow {
    /// Stock ticker.
    pub symbol: String,
    /// Company name.
    #[serde(rename = "companyName", default)]
    pub company_name: String,
    /// Business sector.
    #[serde(default)]
    pub sector: String,
    /// Industry within the sector.
    #[serde(default)]
    pub industry: String,
    /// Primary exchange.
    #[serde(rename = "exchangeShortName", default)]
    pub exchange: Option<String>,
    /// Trading currency.
    #[serde(default)]
    pub currency: Option<String>,
}

/// One row of a per-fiscal-year `income_<FY>.csv` file.
#[derive(Debug, Clone, Deserialize)]
struct BulkIncomeRow {
    symbol: String,
    #[serde(default)]
    revenue: Option<f64>,
    #[serde(rename = "netIncome", default)]
    net_income: Option<f64>,
}

/// One row of a per-fiscal-year `balance_<FY>.csv` file.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkBalanceRow {
    /// Stock ticker.
    pub symbol: String,
    /// Total debt.
    #[serde(rename = "totalDebt", default)]
    pub total_debt: Option<f64>,
    /// Total stockholders' equity.
    #[serde(rename = "totalStockholdersEquity", default)]
    pub total_equity: Option<f64>,
}

/// One row of a per-fiscal-year `cashflow_<FY>.csv` file.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkCashflowRow {
    /// Stock ticker.
    pub symbol: String,
    /// Free cash flow.
    #[serde(rename = "freeCashFlow", default)]
    pub free_cash_flow: Option<f64>,
    /// Dividends paid (negative in provider exports).
    #[serde(rename = "dividendsPaid", default)]
    pub dividends_paid: Option<f64>,
}

/// One row of `ratios.csv` (TTM figures).
#[derive(Debug, Clone, Deserialize)]
struct BulkRatiosRow {
    symbol: String,
    #[serde(rename = "peRatioTTM", default)]
    pe_ratio_ttm: Option<f64>,
    #[serde(rename = "debtToEquityTTM", default)]
    debt_to_equity_ttm: Option<f64>,
    #[serde(rename = "returnOnEquityTTM", default)]
    return_on_equity_ttm: Option<f64>,
    #[serde(rename = "grossProfitMarginTTM", default)]
    gross_profit_margin_ttm: Option<f64>,
    #[serde(rename = "operatingProfitMarginTTM", default)]
    operating_profit_margin_ttm: Option<f64>,
}

/// One row of `metrics.csv` (TTM figures).
#[derive(Debug, Clone, Deserialize)]
struct BulkMetricsRow {
    symbol: String,
    #[serde(rename = "roicTTM", default)]
    roic_ttm: Option<f64>,
    #[serde(rename = "marketCapTTM", default)]
    market_cap: Option<f64>,
    #[serde(rename = "pbRatioTTM", default)]
    pb_ratio_ttm: Option<f64>,
    #[serde(rename = "priceToSalesRatioTTM", default)]
    price_to_sales_ratio_ttm: Option<f64>,
    #[serde(rename = "evToEBITDATTM", default)]
    ev_to_ebitda_ttm: Option<f64>,
    #[serde(rename = "freeCashFlowYieldTTM", default)]
    free_cash_flow_yield_ttm: Option<f64>,
}

/// A fiscal-year-tagged balance sheet row.
#[derive(Debug, Clone)]
pub struct BalanceYear {
    /// Fiscal year the row covers.
    pub fiscal_year: i32,
    /// The parsed row.
    pub row: BulkBalanceRow,
}

/// A fiscal-year-tagged cash flow row.
#[derive(Debug, Clone)]
pub struct CashflowYear {
    /// Fiscal year the row covers.
    pub fiscal_year: i32,
    /// The parsed row.
    pub row: BulkCashflowRow,
}

/// The parsed bulk snapshot: one in-memory table per dataset kind.
#[derive(Debug, Default)]
pub struct BulkTables {
    profiles: HashMap<String, BulkProfileRow>,
    income: HashMap<String, Vec<IncomeRow>>,
    balance: HashMap<String, Vec<BalanceYear>>,
    cashflow: HashMap<String, Vec<CashflowYear>>,
    ratios: HashMap<String, BulkRatiosRow>,
    metrics: HashMap<String, BulkMetricsRow>,
}

impl BulkTables {
    /// Every ticker present in the profile table, sorted ascending.
    #[must_use]
    pub fn tickers(&self) -> Vec<Ticker> {
        let mut tickers: Vec<Ticker> = self.profiles.keys().map(Ticker::new).collect();
        tickers.sort();
        tickers
    }

    /// Number of tickers in the profile table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True if no profiles were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// The company profile for a ticker, if present.
    #[must_use]
    pub fn profile(&self, ticker: &Ticker) -> Option<CompanyProfile> {
        let row = self.profiles.get(ticker.as_str())?;
        Some(CompanyProfile {
            ticker: ticker.clone(),
            name: row.company_name.clone(),
            sector: row.sector.clone(),
            industry: row.industry.clone(),
            exchange: row.exchange.clone(),
            currency: row.currency.clone(),
        })
    }

    /// The canonical ratio set for a ticker, if a ratios row is present.
    ///
    /// Debt-to-equity falls back to the most recent balance sheet when the
    /// ratios export lacks it.
    #[must_use]
    pub fn ratio_set(&self, ticker: &Ticker) -> Option<RatioSet> {
        let row = self.ratios.get(ticker.as_str())?;
        Some(RatioSet {
            pe_ttm: row.pe_ratio_ttm,
            debt_to_equity: finite(row.debt_to_equity_ttm)
                .or_else(|| self.balance_debt_to_equity(ticker)),
            roe: row.return_on_equity_ttm,
            gross_margin: row.gross_profit_margin_ttm,
            operating_margin: row.operating_profit_margin_ttm,
        })
    }

    /// The canonical metric set for a ticker, if a metrics row is present.
    ///
    /// FCF yield falls back to the most recent cash flow statement divided
    /// by market cap when the metrics export lacks it.
    #[must_use]
    pub fn metric_set(&self, ticker: &Ticker) -> Option<MetricSet> {
        let row = self.metrics.get(ticker.as_str())?;
        Some(MetricSet {
            roic: row.roic_ttm,
            roe: None,
            debt_to_equity: self.balance_debt_to_equity(ticker),
            market_cap: row.market_cap,
            pb: row.pb_ratio_ttm,
            ps: row.price_to_sales_ratio_ttm,
            ev_to_ebitda: row.ev_to_ebitda_ttm,
            fcf_yield: finite(row.free_cash_flow_yield_ttm)
                .or_else(|| self.cashflow_fcf_yield(ticker, row.market_cap)),
        })
    }

    /// A ticker's income rows in no particular order.
    #[must_use]
    pub fn income_rows(&self, ticker: &Ticker) -> Vec<IncomeRow> {
        self.income.get(ticker.as_str()).cloned().unwrap_or_default()
    }

    fn balance_debt_to_equity(&self, ticker: &Ticker) -> Option<f64> {
        let rows = self.balance.get(ticker.as_str())?;
        let latest = rows.iter().max_by_key(|r| r.fiscal_year)?;
        let debt = finite(latest.row.total_debt)?;
        let equity = finite(latest.row.total_equity).filter(|v| *v != 0.0)?;
        finite(Some(debt / equity))
    }

    fn cashflow_fcf_yield(&self, ticker: &Ticker, market_cap: Option<f64>) -> Option<f64> {
        let rows = self.cashflow.get(ticker.as_str())?;
        let latest = rows.iter().max_by_key(|r| r.fiscal_year)?;
        let fcf = finite(latest.row.free_cash_flow)?;
        let market_cap = finite(market_cap).filter(|v| *v != 0.0)?;
        finite(Some(fcf / market_cap))
    }
}

/// Loads the bulk CSV exports once per process lifetime.
///
/// The first call to [`tables`](Self::tables) reads and parses every
/// configured file; all later calls return the same cached [`Arc`]. The
/// guarded one-time initialization makes a racing first call safe: exactly
/// one caller loads, the rest await the result.
#[derive(Debug)]
pub struct BulkLoader {
    dir: PathBuf,
    tables: OnceCell<Arc<BulkTables>>,
}

impl BulkLoader {
    /// Creates a loader over the given bulk-export directory.
    ///
    /// Nothing is read until the first [`tables`](Self::tables) call.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tables: OnceCell::new(),
        }
    }

    /// Returns the parsed bulk snapshot, loading it on first use.
    pub async fn tables(&self) -> Result<Arc<BulkTables>> {
        self.tables
            .get_or_try_init(|| async { load_dir(&self.dir).map(Arc::new) })
            .await
            .cloned()
    }
}

/// Parse every bulk file in the directory into in-memory tables.
fn load_dir(dir: &Path) -> Result<BulkTables> {
    let mut tables = BulkTables::default();

    let profiles_path = dir.join("profiles.csv");
    if !profiles_path.is_file() {
        return Err(IngestError::Parse(format!(
            "bulk directory {} has no profiles.csv",
            dir.display()
        )));
    }
    for row in read_csv::<BulkProfileRow>(&profiles_path)? {
        tables.profiles.insert(normalize_symbol(&row.symbol), row);
    }

    for row in read_optional_csv::<BulkRatiosRow>(&dir.join("ratios.csv"))? {
        tables.ratios.insert(normalize_symbol(&row.symbol), row);
    }
    for row in read_optional_csv::<BulkMetricsRow>(&dir.join("metrics.csv"))? {
        tables.metrics.insert(normalize_symbol(&row.symbol), row);
    }

    for (year, path) in statement_files(dir, "income")? {
        for row in read_csv::<BulkIncomeRow>(&path)? {
            tables
                .income
                .entry(normalize_symbol(&row.symbol))
                .or_default()
                .push(IncomeRow {
                    fiscal_year: year,
                    revenue: row.revenue,
                    net_income: row.net_income,
                });
        }
    }
    for (year, path) in statement_files(dir, "balance")? {
        for row in read_csv::<BulkBalanceRow>(&path)? {
            tables
                .balance
                .entry(normalize_symbol(&row.symbol))
                .or_default()
                .push(BalanceYear {
                    fiscal_year: year,
                    row,
                });
        }
    }
    for (year, path) in statement_files(dir, "cashflow")? {
        for row in read_csv::<BulkCashflowRow>(&path)? {
            tables
                .cashflow
                .entry(normalize_symbol(&row.symbol))
                .or_default()
                .push(CashflowYear {
                    fiscal_year: year,
                    row,
                });
        }
    }

    debug!(
        profiles = tables.profiles.len(),
        ratios = tables.ratios.len(),
        metrics = tables.metrics.len(),
        income_tickers = tables.income.len(),
        "Bulk snapshot loaded from {}",
        dir.display()
    );
    Ok(tables)
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Deserialize every record of one CSV file.
fn read_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .map_err(|e| IngestError::Parse(format!("{}: {e}", path.display())))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: T = record.map_err(|e| IngestError::Parse(format!("{}: {e}", path.display())))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Like [`read_csv`] but a missing file yields an empty table with a warning.
fn read_optional_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.is_file() {
        warn!("bulk file {} not found, table left empty", path.display());
        return Ok(Vec::new());
    }
    read_csv(path)
}

/// Find `<prefix>_<FY>.csv` files in the directory, with their fiscal years.
fn statement_files(dir: &Path, prefix: &str) -> Result<Vec<(i32, PathBuf)>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| IngestError::Parse(format!("{}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestError::Parse(e.to_string()))?;
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(year_part) = stem.strip_prefix(&format!("{prefix}_")) else {
            continue;
        };
        match year_part.parse::<i32>() {
            Ok(year) => files.push((year, path)),
            Err(_) => warn!("ignoring bulk file with unparseable year: {}", path.display()),
        }
    }
    files.sort_by_key(|(year, _)| *year);
    Ok(files)
}
