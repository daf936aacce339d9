//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use glowhaus_api::OrderQuery;
use glowhaus_core::models::ReportPeriod;
use tracing::instrument;

use crate::filters;
use crate::middleware::SessionTokenStore;
use crate::state::AppState;
use crate::views::{AdminPage, OrderRow, ReportView, render};

/// Orders shown in the "recent orders" panel.
const RECENT_ORDERS: u32 = 5;

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: AdminPage,
    pub period: ReportPeriod,
    pub report: Option<ReportView>,
    /// Most recent orders.
    pub orders: Vec<OrderRow>,
}

/// Dashboard page handler.
///
/// The report and the order list load concurrently; if either call fails
/// the page still renders with that panel empty.
#[instrument(skip_all)]
pub async fn index(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
) -> Html<String> {
    let period = ReportPeriod::default();
    let recent_query = OrderQuery {
        page_size: Some(RECENT_ORDERS),
        ..OrderQuery::default()
    };

    let (report, orders) = tokio::join!(
        state.api().report_summary(&store, period),
        state.api().all_orders(&store, &recent_query),
    );

    let report = match report {
        Ok(summary) => Some(ReportView::new(&summary, state.currency())),
        Err(e) => {
            tracing::warn!("Failed to load report summary: {e}");
            None
        }
    };

    let orders = match orders {
        Ok(orders) => orders
            .iter()
            .take(RECENT_ORDERS as usize)
            .map(|o| OrderRow::new(o, state.currency()))
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to load recent orders: {e}");
            Vec::new()
        }
    };

    render(&DashboardTemplate {
        page,
        period,
        report,
        orders,
    })
}
