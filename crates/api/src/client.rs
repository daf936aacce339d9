//! HTTP client for the commerce API.
//!
//! Every call goes through [`ApiClient::send_public`] or
//! [`ApiClient::send_authed`]. Authenticated calls attach the visitor's
//! bearer token and, when the API answers 401, renew the token pair once
//! and retry once. Concurrent renewals for the same refresh token share a
//! single `POST /auth/token/refresh/`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::{TokenPair, TokenStore};
use crate::cache::CacheValue;
use crate::error::{ApiError, FieldErrors};

/// Token refresh endpoint.
pub(crate) const REFRESH_PATH: &str = "/auth/token/refresh/";

/// How long a completed refresh is reused for the same refresh token.
const REFRESH_REUSE: Duration = Duration::from_secs(30);

/// How long public catalog reads are cached.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Maximum number of response body characters kept in errors and logs.
const BODY_EXCERPT: usize = 500;

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for the API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL all paths are appended to, e.g. `https://api.glowhaus.co/api`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl ApiConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
            user_agent: format!("glowhaus-web/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A request that can be sent, and re-sent after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    /// Append a query parameter when present and non-empty.
    #[must_use]
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value.map(|v| v.to_string()).filter(|v| !v.is_empty()) {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Json` if the body cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the commerce REST API.
///
/// Cheap to clone; clones share the connection pool and caches.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    /// In-flight and recently completed refreshes, keyed by refresh token.
    refreshes: Cache<String, TokenPair>,
    /// Public catalog responses.
    catalog: Cache<String, CacheValue>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let refreshes = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(REFRESH_REUSE)
            .build();

        let catalog = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CATALOG_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
                refreshes,
                catalog,
            }),
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Send a request without credentials.
    ///
    /// # Errors
    ///
    /// Returns the mapped API error for non-success responses.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send_public<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.dispatch(&request, None).await?;
        decode(response).await
    }

    /// Send a request as the visitor whose tokens are in `store`.
    ///
    /// An expired access token is renewed before sending. A 401 renews the
    /// token pair once and retries once; if the retry is also refused, or
    /// the refresh fails for any reason, the store is cleared and
    /// `ApiError::SessionExpired` is returned.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` when the store is empty,
    /// `ApiError::SessionExpired` when the session cannot be renewed, or the
    /// mapped API error for other non-success responses.
    #[instrument(skip(self, store, request), fields(method = %request.method, path = %request.path))]
    pub async fn send_authed<T, S>(&self, store: &S, request: ApiRequest) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        S: TokenStore,
    {
        let Some(mut tokens) = store.load().await else {
            return Err(ApiError::Unauthenticated);
        };

        let mut refreshed = false;
        if tokens.access_expired() {
            debug!("Access token expired, refreshing before request");
            tokens = self.refresh(store, &tokens).await?;
            refreshed = true;
        }

        let response = self.dispatch(&request, Some(&tokens.access)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return decode(response).await;
        }

        if refreshed {
            warn!("Freshly issued access token was rejected");
            store.clear().await;
            return Err(ApiError::SessionExpired);
        }

        debug!("Access token rejected, refreshing and retrying once");
        tokens = self.refresh(store, &tokens).await?;

        let retry = self.dispatch(&request, Some(&tokens.access)).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            warn!("Retried request was rejected after refresh");
            store.clear().await;
            return Err(ApiError::SessionExpired);
        }
        decode(retry).await
    }

    /// Check that the API answers without a server error.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is unreachable or returns a 5xx status.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let response = self.dispatch(&ApiRequest::get("/settings/"), None).await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.inner.base_url, request.path);
        let mut builder = self.inner.http.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        debug!(status = %response.status(), "API response");
        Ok(response)
    }

    // =========================================================================
    // Token refresh
    // =========================================================================

    /// Exchange the refresh token for a new pair and save it.
    ///
    /// Callers racing on the same refresh token share one request.
    async fn refresh<S: TokenStore>(&self, store: &S, current: &TokenPair) -> Result<TokenPair, ApiError> {
        let refresh_token = current.refresh.clone();
        let result = self
            .inner
            .refreshes
            .try_get_with(refresh_token.clone(), self.request_refresh(refresh_token))
            .await;

        match result {
            Ok(tokens) => {
                store.save(&tokens).await;
                Ok(tokens)
            }
            Err(err) => {
                if err.is_rejection() {
                    warn!(error = %err, "Refresh token rejected, clearing session tokens");
                } else {
                    warn!(error = %err, "Token refresh failed, clearing session tokens");
                }
                store.clear().await;
                Err(ApiError::SessionExpired)
            }
        }
    }

    #[instrument(skip_all)]
    async fn request_refresh(&self, refresh_token: String) -> Result<TokenPair, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest {
            refresh: &refresh_token,
        })?;
        let response = self.dispatch(&request, None).await?;
        let body: RefreshResponse = decode(response).await?;
        debug!(rotated = body.refresh.is_some(), "Token pair refreshed");

        Ok(TokenPair::new(
            body.access,
            body.refresh.unwrap_or(refresh_token),
        ))
    }

    // =========================================================================
    // Catalog cache
    // =========================================================================

    pub(crate) async fn cache_get(&self, key: &str) -> Option<CacheValue> {
        self.inner.catalog.get(key).await
    }

    pub(crate) async fn cache_put(&self, key: String, value: CacheValue) {
        self.inner.catalog.insert(key, value).await;
    }

    /// Drop this client's cached catalog data. Called after back-office
    /// writes; other processes keep theirs until the TTL runs out.
    pub async fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate_all();
        self.inner.catalog.run_pending_tasks().await;
    }
}

/// Map a response to a value or an error.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ApiError::RateLimited(retry_after));
    }

    let text = response.text().await?;

    if status.is_success() {
        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        return serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&text),
                "Failed to parse API response"
            );
            ApiError::Json(e)
        });
    }

    Err(match status {
        StatusCode::BAD_REQUEST => ApiError::Validation(FieldErrors::from_body(&text)),
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden(detail(&text)),
        StatusCode::NOT_FOUND => ApiError::NotFound,
        _ => {
            tracing::error!(
                status = %status,
                body = %excerpt(&text),
                "API returned non-success status"
            );
            ApiError::Upstream {
                status: status.as_u16(),
                body: excerpt(&text),
            }
        }
    })
}

fn excerpt(text: &str) -> String {
    text.chars().take(BODY_EXCERPT).collect()
}

/// The `detail` message of an error body, if any.
fn detail(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned))
        .unwrap_or_else(|| "You do not have permission to perform this action.".to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::test_support::{FakeApi, access_token};

    #[derive(Debug, Deserialize)]
    struct Orders(Vec<serde_json::Value>);

    #[tokio::test]
    async fn test_send_authed_without_tokens() {
        let api = FakeApi::start().await;
        let store = MemoryTokenStore::new();

        let result: Result<Orders, _> = api
            .client
            .send_authed(&store, ApiRequest::get("/orders/orders/"))
            .await;

        assert!(matches!(result, Err(ApiError::Unauthenticated)));
        assert_eq!(api.state.order_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_token_is_attached() {
        let api = FakeApi::start().await;
        let store = MemoryTokenStore::with_tokens(api.valid_pair());

        let orders: Orders = api
            .client
            .send_authed(&store, ApiRequest::get("/orders/orders/"))
            .await
            .unwrap();

        assert_eq!(orders.0.len(), 1);
        assert_eq!(api.state.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_401_refreshes_and_retries_once() {
        let api = FakeApi::start().await;
        let store = MemoryTokenStore::with_tokens(api.revoked_pair("refresh-1"));

        let orders: Orders = api
            .client
            .send_authed(&store, ApiRequest::get("/orders/orders/"))
            .await
            .unwrap();

        assert_eq!(orders.0.len(), 1);
        assert_eq!(api.state.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.state.order_calls.load(Ordering::SeqCst), 2);

        let saved = store.load().await.unwrap();
        assert_eq!(saved.access, api.state.valid_access);
        assert_eq!(saved.refresh, "refresh-rotated");
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let api = FakeApi::start().await;
        let store = MemoryTokenStore::with_tokens(api.revoked_pair("refresh-1"));

        let get = || {
            api.client
                .send_authed::<Orders, _>(&store, ApiRequest::get("/orders/orders/"))
        };
        let (a, b, c, d) = tokio::join!(get(), get(), get(), get());

        assert!(a.is_ok() && b.is_ok() && c.is_ok() && d.is_ok());
        assert_eq!(api.state.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_access_refreshes_before_sending() {
        let api = FakeApi::start().await;
        let expired = TokenPair::new(access_token(7, -60), "refresh-1".to_owned());
        let store = MemoryTokenStore::with_tokens(expired);

        let _: Orders = api
            .client
            .send_authed(&store, ApiRequest::get("/orders/orders/"))
            .await
            .unwrap();

        assert_eq!(api.state.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.state.order_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_store() {
        let api = FakeApi::start().await;
        let store = MemoryTokenStore::with_tokens(api.revoked_pair("revoked"));

        let result: Result<Orders, _> = api
            .client
            .send_authed(&store, ApiRequest::get("/orders/orders/"))
            .await;

        assert!(matches!(result, Err(ApiError::SessionExpired)));
        assert!(store.load().await.is_none());
        assert_eq!(api.state.order_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_store() {
        let api = FakeApi::start().await;
        let store = MemoryTokenStore::with_tokens(api.revoked_pair("unavailable"));

        let result: Result<Orders, _> = api
            .client
            .send_authed(&store, ApiRequest::get("/orders/orders/"))
            .await;

        assert!(matches!(result, Err(ApiError::SessionExpired)));
        assert!(result.unwrap_err().needs_login());
        assert!(store.load().await.is_none());
        assert_eq!(api.state.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.state.order_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_401_clears_store() {
        let api = FakeApi::start().await;
        let store = MemoryTokenStore::with_tokens(api.revoked_pair("refresh-1"));

        let result: Result<serde_json::Value, _> = api
            .client
            .send_authed(&store, ApiRequest::get("/always-401/"))
            .await;

        assert!(matches!(result, Err(ApiError::SessionExpired)));
        assert!(store.load().await.is_none());
        assert_eq!(api.state.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let api = FakeApi::start().await;

        let validation = api
            .client
            .send_public::<serde_json::Value>(ApiRequest::post("/status/400/"))
            .await
            .unwrap_err();
        let errors = validation.field_errors().unwrap();
        assert_eq!(errors.get("email"), Some("Enter a valid email address."));

        assert!(matches!(
            api.client
                .send_public::<serde_json::Value>(ApiRequest::get("/status/404/"))
                .await,
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            api.client
                .send_public::<serde_json::Value>(ApiRequest::get("/status/429/"))
                .await,
            Err(ApiError::RateLimited(7))
        ));
        assert!(matches!(
            api.client
                .send_public::<serde_json::Value>(ApiRequest::get("/status/502/"))
                .await,
            Err(ApiError::Upstream { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_success_body_decodes_as_unit() {
        let api = FakeApi::start().await;
        api.client
            .send_public::<()>(ApiRequest::post("/status/204/"))
            .await
            .unwrap();
    }

    #[test]
    fn test_query_opt_skips_empty() {
        let request = ApiRequest::get("/products/products/")
            .query_opt("search", Some(""))
            .query_opt("category", Some("serums"))
            .query_opt::<u32>("page", None);
        assert_eq!(
            request.query_pairs(),
            &[("category".to_owned(), "serums".to_owned())]
        );
    }
}
