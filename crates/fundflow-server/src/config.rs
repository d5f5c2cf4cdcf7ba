//! Environment configuration, read once at startup.

use fundflow_core::{IngestError, Result};
use std::fmt;
use tracing::warn;

const DEFAULT_PORT: u16 = 3000;

/// Server configuration drawn from process environment variables.
pub(crate) struct ServerConfig {
    /// FMP API key (`FMP_API_KEY`, required).
    pub(crate) api_key: String,
    /// Optional FMP base URL override (`FMP_BASE_URL`).
    pub(crate) base_url: Option<String>,
    /// Shared bearer secret for the cron routes (`CRON_SECRET`). When unset,
    /// every protected route answers 401.
    pub(crate) cron_secret: Option<String>,
    /// SQLite database path (`DATABASE_PATH`).
    pub(crate) database_path: String,
    /// Directory holding the bulk CSV exports (`BULK_DATA_DIR`).
    pub(crate) bulk_dir: String,
    /// Listen port (`PORT`).
    pub(crate) port: u16,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("cron_secret", &self.cron_secret.as_ref().map(|_| "[REDACTED]"))
            .field("database_path", &self.database_path)
            .field("bulk_dir", &self.bulk_dir)
            .field("port", &self.port)
            .finish()
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub(crate) fn from_env() -> Result<Self> {
        let api_key = require("FMP_API_KEY")?;
        let base_url = optional("FMP_BASE_URL");
        let cron_secret = optional("CRON_SECRET");
        if cron_secret.is_none() {
            warn!("CRON_SECRET is unset; every cron route will answer 401");
        }

        let database_path =
            optional("DATABASE_PATH").unwrap_or_else(|| "fundflow.db".to_string());
        let bulk_dir = optional("BULK_DATA_DIR").unwrap_or_else(|| "bulk".to_string());
        let port = match optional("PORT") {
            Some(value) => value.parse().map_err(|_| {
                IngestError::Config(format!("PORT must be a port number, got {value:?}"))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key,
            base_url,
            cron_secret,
            database_path,
            bulk_dir,
            port,
        })
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn require(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| IngestError::Config(format!("{name} must be set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let config = ServerConfig {
            api_key: "super-secret".to_string(),
            base_url: None,
            cron_secret: Some("cron-secret".to_string()),
            database_path: "fundflow.db".to_string(),
            bulk_dir: "bulk".to_string(),
            port: 3000,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("cron-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
