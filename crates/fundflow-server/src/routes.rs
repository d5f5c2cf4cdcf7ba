//! HTTP routes: protected cron triggers plus debug reads.
//!
//! Every `/cron/*` route requires `Authorization: Bearer <CRON_SECRET>` and
//! answers 401 before touching any data when the header is missing or wrong.
//! A completed run returns 200 with the `RunReport` JSON; a run-fatal error
//! returns 500 with `{"error": message}`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use fundflow_core::{FinancialStore, Result, RunOptions, RunReport, Ticker};
use fundflow_pipeline::Aggregator;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Shared state handed to every handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) aggregator: Arc<Aggregator>,
    pub(crate) store: Arc<dyn FinancialStore>,
    pub(crate) cron_secret: Option<String>,
}

/// Builds the application router.
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cron/bulk-update", get(cron_bulk_update))
        .route("/cron/valuation-bulk", get(cron_valuation))
        .route("/cron/price-update", get(cron_price_update))
        .route(
            "/cron/sector-performance-aggregator",
            get(cron_sector_performance),
        )
        .route(
            "/cron/industry-performance-aggregator",
            get(cron_industry_performance),
        )
        .route("/sectors", get(list_sectors))
        .route("/prices/{ticker}", get(list_prices))
        .with_state(state)
}

/// Query parameters accepted by the cron routes.
#[derive(Debug, Default, Deserialize)]
struct CronQuery {
    ticker: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl CronQuery {
    fn options(&self) -> RunOptions {
        RunOptions {
            ticker: self
                .ticker
                .as_deref()
                .map(Ticker::new)
                .filter(|t| !t.is_empty()),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

/// True when the request carries the configured bearer secret.
///
/// An unset secret fails every request rather than opening the routes.
fn authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return false;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "unauthorized"})),
    )
        .into_response()
}

fn run_response(result: Result<RunReport>) -> Response {
    match result {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(error = %e, "Run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn cron_bulk_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> Response {
    if !authorized(&headers, state.cron_secret.as_deref()) {
        return unauthorized();
    }
    run_response(state.aggregator.run_bulk_update(&query.options()).await)
}

async fn cron_valuation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> Response {
    if !authorized(&headers, state.cron_secret.as_deref()) {
        return unauthorized();
    }
    run_response(state.aggregator.run_valuation(&query.options()).await)
}

async fn cron_price_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> Response {
    if !authorized(&headers, state.cron_secret.as_deref()) {
        return unauthorized();
    }
    run_response(state.aggregator.run_price_update(&query.options()).await)
}

async fn cron_sector_performance(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers, state.cron_secret.as_deref()) {
        return unauthorized();
    }
    run_response(state.aggregator.run_sector_performance().await)
}

async fn cron_industry_performance(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers, state.cron_secret.as_deref()) {
        return unauthorized();
    }
    run_response(state.aggregator.run_industry_performance().await)
}

async fn list_sectors(State(state): State<AppState>) -> Response {
    match state.store.sector_performance().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            error!(error = %e, "Sector read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

async fn list_prices(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(page): Query<PageQuery>,
) -> Response {
    let ticker = Ticker::new(ticker);
    if ticker.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "ticker must not be empty"})),
        )
            .into_response();
    }

    let limit = page.limit.unwrap_or(100);
    let offset = page.offset.unwrap_or(0);
    match state.store.recent_prices(&ticker, limit, offset).await {
        Ok(bars) => (StatusCode::OK, Json(bars)).into_response(),
        Err(e) => {
            error!(error = %e, %ticker, "Price read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::NaiveDate;
    use fundflow_bulk::BulkLoader;
    use fundflow_core::PriceBar;
    use fundflow_fmp::FmpClient;
    use fundflow_store::InMemoryStore;
    use tower::ServiceExt;

    fn test_state(secret: Option<&str>) -> (AppState, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let client = Arc::new(FmpClient::new("test-key"));
        let bulk = Arc::new(BulkLoader::new("/nonexistent/bulk"));
        let aggregator = Arc::new(Aggregator::new(
            client.clone(),
            client,
            bulk,
            store.clone(),
        ));
        let state = AppState {
            aggregator,
            store: store.clone(),
            cron_secret: secret.map(String::from),
        };
        (state, store)
    }

    fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn report_from(response: Response) -> RunReport {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_is_unauthenticated() {
        let (state, _) = test_state(Some("s3cret"));
        let response = router(state)
            .oneshot(get_request("/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cron_routes_require_the_bearer_secret() {
        let (state, store) = test_state(Some("s3cret"));
        let app = router(state);

        let missing = app
            .clone()
            .oneshot(get_request("/cron/bulk-update", None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = app
            .oneshot(get_request("/cron/bulk-update", Some("nope")))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        // Rejected before any work: nothing was written.
        assert!(store.list_tickers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unset_secret_rejects_every_token() {
        let (state, _) = test_state(None);
        let response = router(state)
            .oneshot(get_request("/cron/valuation-bulk", Some("anything")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn fatal_run_errors_surface_as_500() {
        // The bulk directory does not exist, so the snapshot load fails.
        let (state, _) = test_state(Some("s3cret"));
        let response = router(state)
            .oneshot(get_request("/cron/bulk-update", Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn completed_run_returns_the_report() {
        // Empty store: the valuation universe is empty, so the run completes
        // without touching the network.
        let (state, _) = test_state(Some("s3cret"));
        let response = router(state)
            .oneshot(get_request("/cron/valuation-bulk", Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let report = report_from(response).await;
        assert!(report.success);
        assert_eq!(report.processed, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn price_debug_route_pages_newest_first() {
        let (state, store) = test_state(Some("s3cret"));
        let ticker = Ticker::new("AAPL");
        let bars: Vec<PriceBar> = (1..=3)
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

        let response = router(state)
            .oneshot(get_request("/prices/aapl?limit=2", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let bars: Vec<PriceBar> = serde_json::from_slice(&body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 3.0);
    }
}
