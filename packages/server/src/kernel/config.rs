//! Environment-backed server configuration.

use anyhow::{Context, Result};

/// Configuration loaded from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    /// API key for the OpenAI-compatible provider.
    pub provider_api_key: String,
    /// Override for the provider base URL (proxies, compatible gateways).
    pub provider_base_url: Option<String>,
    pub search_model: Option<String>,
    pub validation_model: Option<String>,
    /// Number of polling discovery workers.
    pub worker_count: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let provider_api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a number")?,
            Err(_) => 8080,
        };
        let worker_count = match std::env::var("DISCOVERY_WORKERS") {
            Ok(raw) => raw.parse().context("DISCOVERY_WORKERS must be a number")?,
            Err(_) => 4,
        };

        Ok(Self {
            database_url,
            port,
            provider_api_key,
            provider_base_url: std::env::var("OPENAI_BASE_URL").ok(),
            search_model: std::env::var("SEARCH_MODEL").ok(),
            validation_model: std::env::var("VALIDATION_MODEL").ok(),
            worker_count,
        })
    }
}
