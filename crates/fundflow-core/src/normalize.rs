//! Normalization of provider records into canonical rows.
//!
//! [`normalize`] is a pure function: deterministic given identical inputs
//! except for the embedded `normalized_at` timestamp, and free of side
//! effects. A ticker with incomplete source coverage yields `None` and is
//! excluded from the aggregate rather than producing a partially-null row.

use chrono::Utc;

use crate::types::{
    CompanyProfile, MetricSet, NormalizedFinancialRecord, Quote, RatioSet, Ticker,
};

/// Filters a value to `Some` only when it is a finite number.
///
/// Absent or non-finite source values must map to `None`, never to zero.
#[must_use]
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Maps one ticker's provider records into a [`NormalizedFinancialRecord`].
///
/// Returns `None` if `profile`, `ratios`, or `metrics` is absent; `quote` is
/// optional and only supplies fallbacks. Where both the ratio and metric
/// sets carry a field, the ratio set wins and the metric set backfills.
#[must_use]
pub fn normalize(
    ticker: &Ticker,
    profile: Option<&CompanyProfile>,
    ratios: Option<&RatioSet>,
    metrics: Option<&MetricSet>,
    quote: Option<&Quote>,
    source: &str,
) -> Option<NormalizedFinancialRecord> {
    let profile = profile?;
    let ratios = ratios?;
    let metrics = metrics?;

    Some(NormalizedFinancialRecord {
        ticker: ticker.clone(),
        sector: profile.sector.clone(),
        industry: profile.industry.clone(),
        pe_ttm: finite(ratios.pe_ttm).or_else(|| finite(quote.and_then(|q| q.pe))),
        debt_to_equity: finite(ratios.debt_to_equity).or_else(|| finite(metrics.debt_to_equity)),
        roe: finite(ratios.roe).or_else(|| finite(metrics.roe)),
        roic: finite(metrics.roic),
        gross_margin: finite(ratios.gross_margin),
        operating_margin: finite(ratios.operating_margin),
        source: source.to_string(),
        normalized_at: Utc::now(),
    })
}
