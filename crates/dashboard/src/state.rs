//! Application state shared across handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ApiError};
use crate::cache::QueryCache;
use crate::config::DashboardConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Owns the backend client, the query cache,
/// and the shutdown token every backend call races.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    api: ApiClient,
    cache: QueryCache,
    shutdown: CancellationToken,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built from the
    /// configured URL.
    pub fn new(config: DashboardConfig) -> Result<Self, ApiError> {
        let shutdown = CancellationToken::new();
        let api = ApiClient::new(config.backend_url.as_str(), config.request_timeout)?
            .with_cancellation(shutdown.clone());
        let cache = QueryCache::new(config.cache_capacity, config.cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                cache,
                shutdown,
            }),
        })
    }

    /// Get a reference to the dashboard configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the query cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Token cancelled at graceful shutdown.
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }
}
