//! Server kernel: shared handles every domain component needs.

pub mod config;

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use discovery::providers::{OpenAiClient, SearchProvider};
use discovery::providers::search::EventExtractor;
use discovery::providers::validator::ValidationProvider;

use config::ServerConfig;

/// Shared state: the database pool and the external provider handles.
pub struct ServerKernel {
    pub db_connection: PgPool,
    pub search_provider: Arc<dyn SearchProvider>,
    pub event_extractor: Arc<dyn EventExtractor>,
    pub validation_provider: Arc<dyn ValidationProvider>,
    pub config: ServerConfig,
}

impl ServerKernel {
    /// Build the kernel from a connected pool and loaded configuration.
    pub fn new(db_connection: PgPool, config: ServerConfig) -> Result<Arc<Self>> {
        let mut client = OpenAiClient::new(config.provider_api_key.clone())?;
        if let Some(base_url) = &config.provider_base_url {
            client = client.with_base_url(base_url.clone());
        }
        if let Some(model) = &config.search_model {
            client = client.with_search_model(model.clone());
        }
        if let Some(model) = &config.validation_model {
            client = client.with_validation_model(model.clone());
        }
        let client = Arc::new(client);

        Ok(Arc::new(Self {
            db_connection,
            search_provider: client.clone(),
            event_extractor: client.clone(),
            validation_provider: client,
            config,
        }))
    }
}
