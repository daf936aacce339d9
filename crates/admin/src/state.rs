//! Application state shared across handlers.

use std::sync::Arc;

use glowhaus_api::{ApiClient, ApiError};
use glowhaus_core::CurrencyCode;
use sqlx::PgPool;

use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    api: ApiClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api_config())?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, pool, api }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Commerce API client. Staff calls go through [`ApiClient::send_authed`]
    /// with the session's token pair, so nothing here is cached per staff
    /// member.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.config.currency
    }
}
