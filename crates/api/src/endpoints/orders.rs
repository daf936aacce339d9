//! Orders.

use tracing::instrument;

use glowhaus_core::models::{NewOrder, Order, OrderStatusUpdate, Page};
use glowhaus_core::{OrderId, OrderStatus, UserId};

use crate::auth::TokenStore;
use crate::client::{ApiClient, ApiRequest};
use crate::ApiError;

const ORDERS_PATH: &str = "/orders/orders/";

/// Filters for the staff order listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
    pub customer: Option<UserId>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl OrderQuery {
    fn request(&self) -> ApiRequest {
        ApiRequest::get(ORDERS_PATH)
            .query_opt("status", self.status.map(OrderStatus::as_str))
            .query_opt("search", self.search.as_deref().map(str::trim))
            .query_opt("customer", self.customer)
            .query_opt("page", self.page)
            .query_opt("page_size", self.page_size)
            .query("ordering", "-created_at")
    }
}

impl ApiClient {
    /// The signed-in visitor's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn my_orders<S: TokenStore>(&self, store: &S, page: Option<u32>) -> Result<Page<Order>, ApiError> {
        let query = OrderQuery {
            page,
            ..OrderQuery::default()
        };
        self.send_authed(store, query.request()).await
    }

    /// A single order. The API scopes shoppers to their own orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist or belongs to
    /// someone else.
    pub async fn order<S: TokenStore>(&self, store: &S, id: OrderId) -> Result<Order, ApiError> {
        self.send_authed(store, ApiRequest::get(format!("{ORDERS_PATH}{id}/")))
            .await
    }

    /// Place an order. The API prices it and reserves stock.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects the order.
    #[instrument(skip(self, store, order), fields(items = order.items.len()))]
    pub async fn create_order<S: TokenStore>(&self, store: &S, order: &NewOrder) -> Result<Order, ApiError> {
        let request = ApiRequest::post(ORDERS_PATH).json(order)?;
        self.send_authed(store, request).await
    }

    /// List orders as staff.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn all_orders<S: TokenStore>(&self, store: &S, query: &OrderQuery) -> Result<Page<Order>, ApiError> {
        self.send_authed(store, query.request()).await
    }

    /// Move an order to a new status. The API enforces allowed transitions.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the transition is not allowed.
    #[instrument(skip(self, store))]
    pub async fn update_order_status<S: TokenStore>(
        &self,
        store: &S,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let request =
            ApiRequest::patch(format!("{ORDERS_PATH}{id}/")).json(&OrderStatusUpdate { status })?;
        self.send_authed(store, request).await
    }
}
