//! Banners and journal entries.

use tracing::{debug, instrument};

use glowhaus_core::BannerId;
use glowhaus_core::models::{Banner, BannerWrite, JournalEntry, JournalWrite, Page};

use super::segment;
use crate::auth::TokenStore;
use crate::cache::{self, CacheValue};
use crate::client::{ApiClient, ApiRequest};
use crate::ApiError;

const BANNERS_PATH: &str = "/content/banners/";
const JOURNAL_PATH: &str = "/content/journal/";

impl ApiClient {
    // =========================================================================
    // Public reads
    // =========================================================================

    /// Active banners, lowest position first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        if let Some(CacheValue::Banners(banners)) = self.cache_get(BANNERS_PATH).await {
            return Ok(banners);
        }

        let page: Page<Banner> = self.send_public(ApiRequest::get(BANNERS_PATH)).await?;
        let mut banners: Vec<Banner> = page.into_iter().filter(|b| b.is_active).collect();
        banners.sort_by_key(|b| b.position);

        self.cache_put(BANNERS_PATH.to_owned(), CacheValue::Banners(banners.clone()))
            .await;
        Ok(banners)
    }

    /// Published journal entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn journal(&self, page: Option<u32>, page_size: Option<u32>) -> Result<Page<JournalEntry>, ApiError> {
        let request = ApiRequest::get(JOURNAL_PATH)
            .query_opt("page", page)
            .query_opt("page_size", page_size);
        let key = cache::key(request.path(), request.query_pairs());

        if let Some(CacheValue::Journal(entries)) = self.cache_get(&key).await {
            debug!("Cache hit for journal");
            return Ok(entries);
        }

        let entries: Page<JournalEntry> = self.send_public(request).await?;
        self.cache_put(key, CacheValue::Journal(entries.clone())).await;
        Ok(entries)
    }

    /// A journal entry with its body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no entry has this slug.
    pub async fn journal_entry(&self, slug: &str) -> Result<JournalEntry, ApiError> {
        let path = format!("{JOURNAL_PATH}{}/", segment(slug)?);
        self.send_public(ApiRequest::get(path)).await
    }

    // =========================================================================
    // Staff
    // =========================================================================

    /// All banners, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn admin_banners<S: TokenStore>(&self, store: &S) -> Result<Vec<Banner>, ApiError> {
        let page: Page<Banner> = self.send_authed(store, ApiRequest::get(BANNERS_PATH)).await?;
        let mut banners = page.results;
        banners.sort_by_key(|b| b.position);
        Ok(banners)
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the banner does not exist.
    pub async fn banner<S: TokenStore>(&self, store: &S, id: BannerId) -> Result<Banner, ApiError> {
        self.send_authed(store, ApiRequest::get(format!("{BANNERS_PATH}{id}/")))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip(self, store, banner), fields(title = %banner.title))]
    pub async fn create_banner<S: TokenStore>(&self, store: &S, banner: &BannerWrite) -> Result<Banner, ApiError> {
        let created = self
            .send_authed(store, ApiRequest::post(BANNERS_PATH).json(banner)?)
            .await?;
        self.invalidate_catalog().await;
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip(self, store, banner))]
    pub async fn update_banner<S: TokenStore>(
        &self,
        store: &S,
        id: BannerId,
        banner: &BannerWrite,
    ) -> Result<Banner, ApiError> {
        let request = ApiRequest::patch(format!("{BANNERS_PATH}{id}/")).json(banner)?;
        let updated = self.send_authed(store, request).await?;
        self.invalidate_catalog().await;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, store))]
    pub async fn delete_banner<S: TokenStore>(&self, store: &S, id: BannerId) -> Result<(), ApiError> {
        self.send_authed::<(), _>(store, ApiRequest::delete(format!("{BANNERS_PATH}{id}/")))
            .await?;
        self.invalidate_catalog().await;
        Ok(())
    }

    /// All journal entries, including drafts.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn admin_journal<S: TokenStore>(
        &self,
        store: &S,
        page: Option<u32>,
    ) -> Result<Page<JournalEntry>, ApiError> {
        let request = ApiRequest::get(JOURNAL_PATH).query_opt("page", page);
        self.send_authed(store, request).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no entry has this slug.
    pub async fn admin_journal_entry<S: TokenStore>(&self, store: &S, slug: &str) -> Result<JournalEntry, ApiError> {
        let path = format!("{JOURNAL_PATH}{}/", segment(slug)?);
        self.send_authed(store, ApiRequest::get(path)).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip(self, store, entry), fields(title = %entry.title))]
    pub async fn create_journal_entry<S: TokenStore>(
        &self,
        store: &S,
        entry: &JournalWrite,
    ) -> Result<JournalEntry, ApiError> {
        let created = self
            .send_authed(store, ApiRequest::post(JOURNAL_PATH).json(entry)?)
            .await?;
        self.invalidate_catalog().await;
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip(self, store, entry))]
    pub async fn update_journal_entry<S: TokenStore>(
        &self,
        store: &S,
        slug: &str,
        entry: &JournalWrite,
    ) -> Result<JournalEntry, ApiError> {
        let path = format!("{JOURNAL_PATH}{}/", segment(slug)?);
        let updated = self
            .send_authed(store, ApiRequest::patch(path).json(entry)?)
            .await?;
        self.invalidate_catalog().await;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, store))]
    pub async fn delete_journal_entry<S: TokenStore>(&self, store: &S, slug: &str) -> Result<(), ApiError> {
        let path = format!("{JOURNAL_PATH}{}/", segment(slug)?);
        self.send_authed::<(), _>(store, ApiRequest::delete(path)).await?;
        self.invalidate_catalog().await;
        Ok(())
    }
}
