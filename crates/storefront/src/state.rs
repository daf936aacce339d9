//! Application state shared across handlers.

use std::sync::Arc;

use glowhaus_api::{ApiClient, ApiError};
use glowhaus_core::models::SiteSettings;
use glowhaus_core::Price;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the configuration, the session
/// database pool, and the commerce API client (whose catalog cache is
/// shared by every request).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    api: ApiClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api.client_config())?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, pool, api }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the session database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Format an amount in the store currency.
    #[must_use]
    pub fn money(&self, amount: Decimal) -> String {
        Price::new(amount, self.inner.config.store.currency).display()
    }

    /// Site settings, or defaults when the API is unavailable.
    ///
    /// Pages render without the announcement bar rather than failing.
    pub async fn site_settings(&self) -> SiteSettings {
        match self.inner.api.site_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load site settings, using defaults");
                SiteSettings::default()
            }
        }
    }
}
