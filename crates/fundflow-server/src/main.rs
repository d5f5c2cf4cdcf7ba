//! fundflow server: HTTP cron routes over the aggregation pipeline.

mod config;
mod routes;

use crate::config::ServerConfig;
use crate::routes::AppState;
use fundflow_bulk::BulkLoader;
use fundflow_fmp::FmpClient;
use fundflow_pipeline::Aggregator;
use fundflow_store::SqliteStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let client = match &config.base_url {
        Some(base_url) => FmpClient::with_base_url(config.api_key.as_str(), base_url.as_str()),
        None => FmpClient::new(config.api_key.as_str()),
    };
    let client = Arc::new(client);
    let store = Arc::new(SqliteStore::new(&config.database_path)?);
    let bulk = Arc::new(BulkLoader::new(&config.bulk_dir));
    let aggregator = Arc::new(Aggregator::new(
        client.clone(),
        client,
        bulk,
        store.clone(),
    ));

    let app = routes::router(AppState {
        aggregator,
        store,
        cron_secret: config.cron_secret.clone(),
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(database = %config.database_path, bulk_dir = %config.bulk_dir, "fundflow server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
