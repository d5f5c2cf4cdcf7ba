#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fundflow/fundflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial Modeling Prep (FMP) data source.
//!
//! This crate implements the fundflow-core source traits for the
//! [Financial Modeling Prep](https://financialmodelingprep.com/) API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fundflow_fmp::FmpClient;
//! use fundflow_core::{FundamentalsSource, Ticker};
//!
//! #[tokio::main]
//! async fn main() -> fundflow_core::Result<()> {
//!     let client = FmpClient::new("your_api_key");
//!     let ticker = Ticker::new("AAPL");
//!
//!     let profile = client.company_profile(&ticker).await?;
//!     let ratios = client.ratios_ttm(&ticker).await?;
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use fundflow_core::{
    CompanyProfile, DataSource, FundamentalsSource, IncomeRow, IngestError, MetricSet, PeriodType,
    PriceBar, PriceSource, Quote, RatioSet, Result, Ticker,
};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

/// Base URL for the FMP stable API.
const FMP_BASE_URL: &str = "https://financialmodelingprep.com/stable";

/// Financial Modeling Prep data source.
///
/// Provides access to:
/// - Company profiles
/// - TTM ratios and key metrics
/// - Quotes
/// - Annual/quarterly income statements
/// - Historical daily prices
#[derive(Clone)]
pub struct FmpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for FmpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FmpClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl FmpClient {
    /// Create a new FMP client with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: FMP_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Create a new FMP client against a custom base URL.
    ///
    /// Used when `FMP_BASE_URL` overrides the default endpoint.
    #[must_use]
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a URL with the API key appended.
    fn url(&self, endpoint: &str) -> String {
        if endpoint.contains('?') {
            format!("{}/{endpoint}&apikey={}", self.base_url, self.api_key)
        } else {
            format!("{}/{endpoint}?apikey={}", self.base_url, self.api_key)
        }
    }

    /// Make a GET request and parse the JSON response.
    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        tracing::debug!("FMP request: {}", endpoint);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IngestError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(IngestError::RateLimited {
                provider: "FMP".to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(IngestError::Network(format!("HTTP {status}: {text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| IngestError::Network(e.to_string()))?;

        // Check for FMP error responses
        if text.contains("\"Error Message\"") || text.contains("\"error\"") {
            return Err(IngestError::Network(text));
        }

        serde_json::from_str(&text).map_err(|e| IngestError::Parse(format!("{e}: {text}")))
    }

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<Vec<FmpProfile>> {
        let endpoint = format!("profile?symbol={}", ticker.as_str());
        self.get(&endpoint).await
    }

    async fn fetch_ratios_ttm(&self, ticker: &Ticker) -> Result<Vec<FmpRatiosTtm>> {
        let endpoint = format!("ratios-ttm?symbol={}", ticker.as_str());
        self.get(&endpoint).await
    }

    async fn fetch_key_metrics_ttm(&self, ticker: &Ticker) -> Result<Vec<FmpKeyMetricsTtm>> {
        let endpoint = format!("key-metrics-ttm?symbol={}", ticker.as_str());
        self.get(&endpoint).await
    }

    async fn fetch_quote(&self, ticker: &Ticker) -> Result<Vec<FmpQuote>> {
        let endpoint = format!("quote?symbol={}", ticker.as_str());
        self.get(&endpoint).await
    }

    async fn fetch_income_statements(
        &self,
        ticker: &Ticker,
        period: PeriodType,
        limit: Option<usize>,
    ) -> Result<Vec<FmpIncomeStatement>> {
        let limit_param = limit.map(|l| format!("&limit={l}")).unwrap_or_default();
        let endpoint = format!(
            "income-statement?symbol={}&period={}{limit_param}",
            ticker.as_str(),
            period.as_query_value()
        );
        self.get(&endpoint).await
    }

    async fn fetch_historical_prices(
        &self,
        ticker: &Ticker,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FmpHistoricalPrice>> {
        let endpoint = format!(
            "historical-price-eod/full?symbol={}&from={from}&to={to}",
            ticker.as_str()
        );
        self.get(&endpoint).await
    }
}

impl DataSource for FmpClient {
    fn name(&self) -> &str {
        "FMP"
    }

    fn description(&self) -> &str {
        "Financial Modeling Prep - Financial data and stock market API"
    }
}

#[async_trait]
impl FundamentalsSource for FmpClient {
    async fn company_profile(&self, ticker: &Ticker) -> Result<CompanyProfile> {
        let profiles = self.fetch_profile(ticker).await?;
        let profile = profiles
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::TickerNotFound(ticker.to_string()))?;

        Ok(CompanyProfile {
            ticker: ticker.clone(),
            name: profile.company_name.unwrap_or_default(),
            sector: profile.sector.unwrap_or_default(),
            industry: profile.industry.unwrap_or_default(),
            exchange: profile.exchange_short_name,
            currency: profile.currency,
        })
    }

    async fn ratios_ttm(&self, ticker: &Ticker) -> Result<RatioSet> {
        let rows = self.fetch_ratios_ttm(ticker).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::TickerNotFound(ticker.to_string()))?;

        Ok(RatioSet {
            pe_ttm: row.pe_ratio_ttm,
            debt_to_equity: row.debt_to_equity_ttm,
            roe: row.return_on_equity_ttm,
            gross_margin: row.gross_profit_margin_ttm,
            operating_margin: row.operating_profit_margin_ttm,
        })
    }

    async fn key_metrics_ttm(&self, ticker: &Ticker) -> Result<MetricSet> {
        let rows = self.fetch_key_metrics_ttm(ticker).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::TickerNotFound(ticker.to_string()))?;

        Ok(MetricSet {
            roic: row.roic_ttm,
            roe: row.return_on_equity_ttm,
            debt_to_equity: row.debt_to_equity_ttm,
            market_cap: row.market_cap,
            pb: row.pb_ratio_ttm,
            ps: row.price_to_sales_ratio_ttm,
            ev_to_ebitda: row.ev_to_ebitda_ttm,
            fcf_yield: row.free_cash_flow_yield_ttm,
        })
    }

    async fn quote(&self, ticker: &Ticker) -> Result<Quote> {
        let quotes = self.fetch_quote(ticker).await?;
        let quote = quotes
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::TickerNotFound(ticker.to_string()))?;

        Ok(Quote {
            price: quote.price,
            pe: quote.pe,
            market_cap: quote.market_cap,
        })
    }

    async fn income_history(
        &self,
        ticker: &Ticker,
        period: PeriodType,
        limit: Option<usize>,
    ) -> Result<Vec<IncomeRow>> {
        let statements = self.fetch_income_statements(ticker, period, limit).await?;

        let rows: Vec<IncomeRow> = statements
            .iter()
            .filter_map(|stmt| {
                let date = NaiveDate::parse_from_str(&stmt.date, "%Y-%m-%d").ok()?;
                Some(IncomeRow {
                    fiscal_year: date.year(),
                    revenue: stmt.revenue,
                    net_income: stmt.net_income,
                })
            })
            .collect();

        if rows.is_empty() {
            return Err(IngestError::TickerNotFound(ticker.to_string()));
        }

        Ok(rows)
    }
}

#[async_trait]
impl PriceSource for FmpClient {
    async fn daily_prices(
        &self,
        ticker: &Ticker,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let prices = self.fetch_historical_prices(ticker, from, to).await?;

        Ok(prices
            .iter()
            .filter_map(|p| {
                let date = NaiveDate::parse_from_str(&p.date, "%Y-%m-%d").ok()?;
                Some(PriceBar {
                    ticker: ticker.clone(),
                    date,
                    open: p.open,
                    high: p.high,
                    low: p.low,
                    close: p.close,
                    volume: p.volume,
                })
            })
            .collect())
    }
}

// ============================================================================
// FMP API Response Types
// ============================================================================

/// FMP Company Profile response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpProfile {
    #[allow(dead_code)]
    symbol: String,
    company_name: Option<String>,
    exchange_short_name: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
    currency: Option<String>,
}

/// FMP TTM Ratios response.
///
/// Field names carry explicit renames because FMP capitalizes the TTM
/// suffix; aliases cover older spellings of the same figure.
#[derive(Debug, Clone, Deserialize)]
struct FmpRatiosTtm {
    #[allow(dead_code)]
    symbol: Option<String>,
    #[serde(rename = "peRatioTTM", alias = "priceEarningsRatioTTM", default)]
    pe_ratio_ttm: Option<f64>,
    #[serde(rename = "debtToEquityTTM", alias = "debtEquityRatioTTM", default)]
    debt_to_equity_ttm: Option<f64>,
    #[serde(rename = "returnOnEquityTTM", default)]
    return_on_equity_ttm: Option<f64>,
    #[serde(rename = "grossProfitMarginTTM", default)]
    gross_profit_margin_ttm: Option<f64>,
    #[serde(rename = "operatingProfitMarginTTM", default)]
    operating_profit_margin_ttm: Option<f64>,
}

/// FMP TTM Key Metrics response.
#[derive(Debug, Clone, Deserialize)]
struct FmpKeyMetricsTtm {
    #[allow(dead_code)]
    symbol: Option<String>,
    #[serde(rename = "roicTTM", alias = "returnOnInvestedCapitalTTM", default)]
    roic_ttm: Option<f64>,
    #[serde(rename = "returnOnEquityTTM", default)]
    return_on_equity_ttm: Option<f64>,
    #[serde(rename = "debtToEquityTTM", default)]
    debt_to_equity_ttm: Option<f64>,
    #[serde(rename = "marketCapTTM", alias = "marketCap", default)]
    market_cap: Option<f64>,
    #[serde(rename = "pbRatioTTM", alias = "priceToBookRatioTTM", default)]
    pb_ratio_ttm: Option<f64>,
    #[serde(rename = "priceToSalesRatioTTM", default)]
    price_to_sales_ratio_ttm: Option<f64>,
    #[serde(rename = "evToEBITDATTM", alias = "enterpriseValueOverEBITDATTM", default)]
    ev_to_ebitda_ttm: Option<f64>,
    #[serde(rename = "freeCashFlowYieldTTM", default)]
    free_cash_flow_yield_ttm: Option<f64>,
}

/// FMP Quote response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpQuote {
    #[allow(dead_code)]
    symbol: String,
    price: Option<f64>,
    pe: Option<f64>,
    market_cap: Option<f64>,
}

/// FMP Income Statement response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpIncomeStatement {
    date: String,
    #[allow(dead_code)]
    symbol: String,
    revenue: Option<f64>,
    net_income: Option<f64>,
}

/// FMP Historical Price response.
#[derive(Debug, Clone, Deserialize)]
struct FmpHistoricalPrice {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}
