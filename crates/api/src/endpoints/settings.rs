//! Site settings.

use tracing::instrument;

use glowhaus_core::models::SiteSettings;

use crate::auth::TokenStore;
use crate::cache::CacheValue;
use crate::client::{ApiClient, ApiRequest};
use crate::ApiError;

const SETTINGS_PATH: &str = "/settings/";

impl ApiClient {
    /// Public site settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn site_settings(&self) -> Result<SiteSettings, ApiError> {
        if let Some(CacheValue::Settings(settings)) = self.cache_get(SETTINGS_PATH).await {
            return Ok(*settings);
        }

        let settings: SiteSettings = self.send_public(ApiRequest::get(SETTINGS_PATH)).await?;
        self.cache_put(
            SETTINGS_PATH.to_owned(),
            CacheValue::Settings(Box::new(settings.clone())),
        )
        .await;
        Ok(settings)
    }

    /// Update site settings as staff.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip_all)]
    pub async fn update_site_settings<S: TokenStore>(
        &self,
        store: &S,
        settings: &SiteSettings,
    ) -> Result<SiteSettings, ApiError> {
        let request = ApiRequest::patch(SETTINGS_PATH).json(settings)?;
        let updated = self.send_authed(store, request).await?;
        self.invalidate_catalog().await;
        Ok(updated)
    }
}
