//! Staff-only reads: customers and reports.

use glowhaus_core::UserId;
use glowhaus_core::models::{Page, ReportPeriod, ReportSummary, User};

use crate::auth::TokenStore;
use crate::client::{ApiClient, ApiRequest};
use crate::ApiError;

const USERS_PATH: &str = "/auth/users/";

/// Filters for the customer listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
}

impl ApiClient {
    /// List customer accounts.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-staff tokens.
    pub async fn customers<S: TokenStore>(&self, store: &S, query: &CustomerQuery) -> Result<Page<User>, ApiError> {
        let request = ApiRequest::get(USERS_PATH)
            .query_opt("search", query.search.as_deref().map(str::trim))
            .query_opt("page", query.page)
            .query("ordering", "-date_joined");
        self.send_authed(store, request).await
    }

    /// A single customer account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the account does not exist.
    pub async fn customer<S: TokenStore>(&self, store: &S, id: UserId) -> Result<User, ApiError> {
        self.send_authed(store, ApiRequest::get(format!("{USERS_PATH}{id}/")))
            .await
    }

    /// Sales summary for a period.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn report_summary<S: TokenStore>(
        &self,
        store: &S,
        period: ReportPeriod,
    ) -> Result<ReportSummary, ApiError> {
        let request = ApiRequest::get("/reports/summary/").query("period", period.as_str());
        self.send_authed(store, request).await
    }
}
