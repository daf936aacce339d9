//! Customer accounts (read-only).

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use glowhaus_api::{CustomerQuery, OrderQuery};
use glowhaus_core::UserId;
use serde::Deserialize;
use tracing::instrument;

use super::API_PAGE_SIZE;
use crate::error::Result;
use crate::filters;
use crate::middleware::SessionTokenStore;
use crate::state::AppState;
use crate::views::{AdminPage, CustomerRow, OrderRow, Pagination, listing_url, render};

/// Orders listed on a customer's page.
const CUSTOMER_ORDERS: u32 = 20;

/// Customer listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// Customer listing template.
#[derive(Template)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub page: AdminPage,
    pub customers: Vec<CustomerRow>,
    pub search: String,
    pub pagination: Pagination,
}

/// Customer detail template.
#[derive(Template)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub page: AdminPage,
    pub customer: CustomerRow,
    pub orders: Vec<OrderRow>,
    pub order_total: u64,
    /// More orders exist than are listed.
    pub more_orders: bool,
}

/// Customer listing page handler.
#[instrument(skip_all)]
pub async fn index(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> Result<Html<String>> {
    let page_number = query.page.unwrap_or(1).max(1);
    let search = query.q.unwrap_or_default();

    let api_query = CustomerQuery {
        search: Some(search.clone()).filter(|s| !s.trim().is_empty()),
        page: Some(page_number),
    };
    let results = state.api().customers(&store, &api_query).await?;

    let base = listing_url("/customers", &[("q", Some(search.as_str()))]);
    Ok(render(&CustomersIndexTemplate {
        page,
        customers: results.iter().map(CustomerRow::from).collect(),
        pagination: Pagination::new(&results, page_number, API_PAGE_SIZE, &base),
        search,
    }))
}

/// Customer detail page handler, with their latest orders.
#[instrument(skip_all, fields(customer_id = %id))]
pub async fn show(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Html<String>> {
    let order_query = OrderQuery {
        customer: Some(id),
        page_size: Some(CUSTOMER_ORDERS),
        ..OrderQuery::default()
    };
    let (customer, orders) = tokio::join!(
        state.api().customer(&store, id),
        state.api().all_orders(&store, &order_query),
    );
    let customer = customer?;

    // The profile is what matters here; a failed order lookup leaves the
    // table empty.
    let (orders, order_total) = match orders {
        Ok(orders) => (OrderRow::list(&orders, page.currency), orders.count),
        Err(e) => {
            tracing::warn!("Failed to load customer orders: {e}");
            (Vec::new(), 0)
        }
    };

    Ok(render(&CustomerShowTemplate {
        page,
        customer: CustomerRow::from(&customer),
        orders,
        order_total,
        more_orders: order_total > u64::from(CUSTOMER_ORDERS),
    }))
}
