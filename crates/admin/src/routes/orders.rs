//! Order management.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use glowhaus_api::{ApiError, OrderQuery};
use glowhaus_core::{OrderId, OrderStatus};
use serde::Deserialize;
use tracing::instrument;

use super::PAGE_SIZE;
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::StatusForm;
use crate::middleware::{RequireStaff, SessionTokenStore, set_flash};
use crate::state::AppState;
use crate::views::{AdminPage, OrderRow, OrderView, Pagination, listing_url, render};

/// Order listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
}

impl OrderListQuery {
    /// Selected status; blank or unrecognised values mean "all".
    fn status(&self) -> Option<OrderStatus> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
    }
}

/// Status filter option.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl StatusOption {
    fn list(selected: Option<OrderStatus>) -> Vec<Self> {
        OrderStatus::SELECTABLE
            .iter()
            .map(|status| Self {
                value: status.as_str(),
                label: status.label(),
                selected: Some(*status) == selected,
            })
            .collect()
    }
}

/// Order listing template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: AdminPage,
    pub orders: Vec<OrderRow>,
    pub statuses: Vec<StatusOption>,
    pub search: String,
    pub pagination: Pagination,
}

/// Order detail template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: AdminPage,
    pub order: OrderView,
    pub statuses: Vec<StatusOption>,
}

/// Order listing page handler.
#[instrument(skip_all)]
pub async fn index(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Html<String>> {
    let page_number = query.page.unwrap_or(1).max(1);
    let status = query.status();
    let search = query.q.clone().unwrap_or_default();

    let api_query = OrderQuery {
        status,
        search: Some(search.clone()).filter(|s| !s.trim().is_empty()),
        page: Some(page_number),
        page_size: Some(PAGE_SIZE),
        ..OrderQuery::default()
    };
    let results = state.api().all_orders(&store, &api_query).await?;

    let base = listing_url(
        "/orders",
        &[("status", status.map(OrderStatus::as_str)), ("q", Some(search.as_str()))],
    );
    Ok(render(&OrdersIndexTemplate {
        orders: OrderRow::list(&results, page.currency),
        statuses: StatusOption::list(status),
        pagination: Pagination::new(&results, page_number, PAGE_SIZE, &base),
        search,
        page,
    }))
}

/// Order detail page handler.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn show(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Html<String>> {
    let order = state.api().order(&store, id).await?;
    Ok(render(&OrderShowTemplate {
        statuses: StatusOption::list(Some(order.status)),
        order: OrderView::new(&order, page.currency),
        page,
    }))
}

/// Move an order to a new status.
///
/// The API enforces which transitions are allowed; its refusal is shown as
/// a flash message on the order page.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn update_status(
    _staff: RequireStaff,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status = form
        .validate()
        .map_err(|errors| AppError::BadRequest(errors.to_string()))?;

    let message = match state.api().update_order_status(&store, id, status).await {
        Ok(order) => {
            tracing::info!(status = order.status.as_str(), "Order status updated");
            format!("Order {} is now {}.", order.display_number(), order.status.label())
        }
        Err(ApiError::Validation(errors)) => {
            tracing::info!(%errors, "Status change refused");
            format!("Status not changed: {errors}")
        }
        Err(e) => return Err(e.into()),
    };

    set_flash(store.session(), message).await;
    Ok(Redirect::to(&format!("/orders/{id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_ignores_unknown_values() {
        let query = OrderListQuery {
            status: Some("shipped".to_string()),
            ..OrderListQuery::default()
        };
        assert_eq!(query.status(), Some(OrderStatus::Shipped));

        for raw in ["", "  ", "lost"] {
            let query = OrderListQuery {
                status: Some(raw.to_string()),
                ..OrderListQuery::default()
            };
            assert_eq!(query.status(), None);
        }
    }

    #[test]
    fn test_status_options_mark_selection() {
        let options = StatusOption::list(Some(OrderStatus::Delivered));
        assert_eq!(options.len(), OrderStatus::SELECTABLE.len());
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, "delivered");
    }
}
