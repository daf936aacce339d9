//! Products and categories.

use tracing::{debug, instrument};

use glowhaus_core::CategoryId;
use glowhaus_core::models::{Category, CategoryWrite, Page, Product, ProductWrite};

use super::segment;
use crate::auth::TokenStore;
use crate::cache::{self, CacheValue};
use crate::client::{ApiClient, ApiRequest};
use crate::ApiError;

const PRODUCTS_PATH: &str = "/products/products/";
const CATEGORIES_PATH: &str = "/products/categories/";

/// Filters for `GET /products/products/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Free-text search.
    pub search: Option<String>,
    /// Backend ordering expression, e.g. `-created_at` or `price`.
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub featured: Option<bool>,
}

impl ProductQuery {
    /// Featured products for the home page.
    #[must_use]
    pub fn featured(limit: u32) -> Self {
        Self {
            featured: Some(true),
            page_size: Some(limit),
            ..Self::default()
        }
    }

    fn request(&self, path: &str) -> ApiRequest {
        ApiRequest::get(path)
            .query_opt("category", self.category.as_deref())
            .query_opt("search", self.search.as_deref().map(str::trim))
            .query_opt("ordering", self.ordering.as_deref())
            .query_opt("page", self.page)
            .query_opt("page_size", self.page_size)
            .query_opt("is_featured", self.featured)
    }

    fn has_search(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

impl ApiClient {
    // =========================================================================
    // Public reads
    // =========================================================================

    /// List products. Searches bypass the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let request = query.request(PRODUCTS_PATH);
        let key = cache::key(request.path(), request.query_pairs());
        let use_cache = !query.has_search();

        if use_cache && let Some(CacheValue::Products(page)) = self.cache_get(&key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let page: Page<Product> = self.send_public(request).await?;
        if use_cache {
            self.cache_put(key, CacheValue::Products(page.clone())).await;
        }
        Ok(page)
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product has this slug.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<Product, ApiError> {
        let path = format!("{PRODUCTS_PATH}{}/", segment(slug)?);

        if let Some(CacheValue::Product(product)) = self.cache_get(&path).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.send_public(ApiRequest::get(path.clone())).await?;
        self.cache_put(path, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Get a product by slug straight from the API, refreshing the cached
    /// copy. For reads that snapshot the price, like adding to a cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product has this slug.
    #[instrument(skip(self))]
    pub async fn product_fresh(&self, slug: &str) -> Result<Product, ApiError> {
        let path = format!("{PRODUCTS_PATH}{}/", segment(slug)?);
        let product: Product = self.send_public(ApiRequest::get(path.clone())).await?;
        self.cache_put(path, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) = self.cache_get(CATEGORIES_PATH).await {
            return Ok(categories);
        }

        let page: Page<Category> = self
            .send_public(ApiRequest::get(CATEGORIES_PATH).query("page_size", 100))
            .await?;
        let categories = page.results;
        self.cache_put(
            CATEGORIES_PATH.to_owned(),
            CacheValue::Categories(categories.clone()),
        )
        .await;
        Ok(categories)
    }

    /// Find a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no category has this slug.
    pub async fn category(&self, slug: &str) -> Result<Category, ApiError> {
        self.categories()
            .await?
            .into_iter()
            .find(|c| c.slug == slug)
            .ok_or(ApiError::NotFound)
    }

    // =========================================================================
    // Staff
    // =========================================================================

    /// List products as staff, including inactive ones. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn admin_products<S: TokenStore>(
        &self,
        store: &S,
        query: &ProductQuery,
    ) -> Result<Page<Product>, ApiError> {
        self.send_authed(store, query.request(PRODUCTS_PATH)).await
    }

    /// Get a product as staff.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product has this slug.
    pub async fn admin_product<S: TokenStore>(&self, store: &S, slug: &str) -> Result<Product, ApiError> {
        let path = format!("{PRODUCTS_PATH}{}/", segment(slug)?);
        self.send_authed(store, ApiRequest::get(path)).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip(self, store, product), fields(name = %product.name))]
    pub async fn create_product<S: TokenStore>(
        &self,
        store: &S,
        product: &ProductWrite,
    ) -> Result<Product, ApiError> {
        let request = ApiRequest::post(PRODUCTS_PATH).json(product)?;
        let created = self.send_authed(store, request).await?;
        self.invalidate_catalog().await;
        Ok(created)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip(self, store, product))]
    pub async fn update_product<S: TokenStore>(
        &self,
        store: &S,
        slug: &str,
        product: &ProductWrite,
    ) -> Result<Product, ApiError> {
        let path = format!("{PRODUCTS_PATH}{}/", segment(slug)?);
        let updated = self
            .send_authed(store, ApiRequest::patch(path).json(product)?)
            .await?;
        self.invalidate_catalog().await;
        Ok(updated)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, store))]
    pub async fn delete_product<S: TokenStore>(&self, store: &S, slug: &str) -> Result<(), ApiError> {
        let path = format!("{PRODUCTS_PATH}{}/", segment(slug)?);
        self.send_authed::<(), _>(store, ApiRequest::delete(path))
            .await?;
        self.invalidate_catalog().await;
        Ok(())
    }

    /// Get a category by id as staff.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the category does not exist.
    pub async fn admin_category<S: TokenStore>(
        &self,
        store: &S,
        id: CategoryId,
    ) -> Result<Category, ApiError> {
        self.send_authed(store, ApiRequest::get(format!("{CATEGORIES_PATH}{id}/")))
            .await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip(self, store, category), fields(name = %category.name))]
    pub async fn create_category<S: TokenStore>(
        &self,
        store: &S,
        category: &CategoryWrite,
    ) -> Result<Category, ApiError> {
        let request = ApiRequest::post(CATEGORIES_PATH).json(category)?;
        let created = self.send_authed(store, request).await?;
        self.invalidate_catalog().await;
        Ok(created)
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects a field.
    #[instrument(skip(self, store, category))]
    pub async fn update_category<S: TokenStore>(
        &self,
        store: &S,
        id: CategoryId,
        category: &CategoryWrite,
    ) -> Result<Category, ApiError> {
        let request = ApiRequest::patch(format!("{CATEGORIES_PATH}{id}/")).json(category)?;
        let updated = self.send_authed(store, request).await?;
        self.invalidate_catalog().await;
        Ok(updated)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, store))]
    pub async fn delete_category<S: TokenStore>(&self, store: &S, id: CategoryId) -> Result<(), ApiError> {
        self.send_authed::<(), _>(store, ApiRequest::delete(format!("{CATEGORIES_PATH}{id}/")))
            .await?;
        self.invalidate_catalog().await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::test_support::FakeApi;

    #[tokio::test]
    async fn test_products_are_cached() {
        let api = FakeApi::start().await;
        let query = ProductQuery {
            category: Some("serums".to_owned()),
            ..ProductQuery::default()
        };

        let first = api.client.products(&query).await.unwrap();
        let second = api.client.products(&query).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.count, 1);
        assert_eq!(api.state.product_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_bypasses_cache() {
        let api = FakeApi::start().await;
        let query = ProductQuery {
            search: Some("serum".to_owned()),
            ..ProductQuery::default()
        };

        api.client.products(&query).await.unwrap();
        api.client.products(&query).await.unwrap();
        assert_eq!(api.state.product_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_staff_write_invalidates_cache() {
        let api = FakeApi::start().await;
        let store = MemoryTokenStore::with_tokens(api.valid_pair());
        let query = ProductQuery::default();

        api.client.products(&query).await.unwrap();
        api.client
            .delete_product(&store, "vitamin-c-serum")
            .await
            .unwrap();
        api.client.products(&query).await.unwrap();

        assert_eq!(api.state.product_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fresh_product_skips_cache() {
        let api = FakeApi::start().await;

        let cached = api.client.product("vitamin-c-serum").await.unwrap();
        api.client.product("vitamin-c-serum").await.unwrap();
        assert_eq!(api.state.product_calls.load(Ordering::SeqCst), 1);

        let fresh = api.client.product_fresh("vitamin-c-serum").await.unwrap();
        assert_eq!(fresh, cached);
        assert_eq!(api.state.product_calls.load(Ordering::SeqCst), 2);

        // The fresh read replaced the cached copy.
        api.client.product("vitamin-c-serum").await.unwrap();
        assert_eq!(api.state.product_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_slug_is_not_found_without_request() {
        let api = FakeApi::start().await;
        let err = api.client.product("../auth/users").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
