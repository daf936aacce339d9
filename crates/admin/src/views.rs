//! Display data for back-office templates.
//!
//! Handlers turn API models into these rows before rendering; templates
//! never format money or dates.

use askama::Template;
use axum::{extract::FromRequestParts, http::request::Parts, response::Html};
use chrono::{DateTime, NaiveDate, Utc};
use glowhaus_core::models::{
    Banner, Category, JournalEntry, Order, Page, Product, ReportSummary, User,
};
use glowhaus_core::{CurrencyCode, OrderStatus, Price};
use rust_decimal::Decimal;
use tower_sessions::Session;

use crate::middleware::{RequireStaff, StaffAuthRejection, take_flash};
use crate::models::CurrentStaff;
use crate::state::AppState;

/// Format an amount in the given currency.
#[must_use]
pub fn money(currency: CurrencyCode, amount: Decimal) -> String {
    Price::new(amount, currency).display()
}

/// Format a timestamp as "3 Mar 2026 14:05".
#[must_use]
pub fn datetime(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%-d %b %Y %H:%M").to_string())
        .unwrap_or_default()
}

/// Format a timestamp as a calendar date.
#[must_use]
pub fn date(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%-d %b %Y").to_string())
        .unwrap_or_default()
}

/// Render a template, logging failures instead of panicking.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

// =============================================================================
// Page chrome
// =============================================================================

/// Staff member shown in the sidebar.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentStaff> for AdminUserView {
    fn from(staff: &CurrentStaff) -> Self {
        Self {
            name: staff.name.clone(),
            email: staff.email.clone(),
        }
    }
}

/// Everything `base.html` needs. Extracting it requires a signed-in staff
/// member and consumes any pending flash message.
#[derive(Debug, Clone)]
pub struct AdminPage {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub currency: CurrencyCode,
}

impl AdminPage {
    /// Whether the sidebar link for `prefix` is the current section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        }
    }

    #[must_use]
    pub fn money(&self, amount: Decimal) -> String {
        money(self.currency, amount)
    }
}

impl FromRequestParts<AppState> for AdminPage {
    type Rejection = StaffAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireStaff(staff) = RequireStaff::from_request_parts(parts, state).await?;
        let flash = match parts.extensions.get::<Session>() {
            Some(session) => take_flash(session).await,
            None => None,
        };

        Ok(Self {
            admin_user: AdminUserView::from(&staff),
            current_path: parts.uri.path().to_string(),
            flash,
            currency: state.currency(),
        })
    }
}

/// Previous/next links for a paginated listing.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u64,
    pub total: u64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pagination {
    /// Build links from `base` (a path, possibly with a query string).
    #[must_use]
    pub fn new<T>(results: &Page<T>, page: u32, page_size: u32, base: &str) -> Self {
        let link = |page: u32| {
            let sep = if base.contains('?') { '&' } else { '?' };
            format!("{base}{sep}page={page}")
        };
        Self {
            page,
            total_pages: results.total_pages(page_size),
            total: results.count,
            prev_url: (results.has_previous() && page > 1).then(|| link(page - 1)),
            next_url: results.has_next().then(|| link(page + 1)),
        }
    }

    #[must_use]
    pub const fn is_needed(&self) -> bool {
        self.prev_url.is_some() || self.next_url.is_some()
    }
}

/// Listing URL with the non-empty filters as query parameters.
#[must_use]
pub fn listing_url(path: &str, params: &[(&str, Option<&str>)]) -> String {
    let query: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{key}={}", urlencoding::encode(v)))
        })
        .collect();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", query.join("&"))
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product row in the catalog table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub slug: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub in_stock: bool,
}

impl ProductRow {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            slug: product.slug.clone(),
            name: product.name.clone(),
            brand: product.brand.clone().unwrap_or_default(),
            category: product.category_name.clone().unwrap_or_default(),
            price: money(currency, product.price),
            compare_at_price: product
                .is_on_sale()
                .then(|| product.compare_at_price.map(|p| money(currency, p)))
                .flatten(),
            image: product.primary_image().map(str::to_string),
            is_active: product.is_active,
            is_featured: product.is_featured,
            in_stock: product.in_stock,
        }
    }
}

/// Category row, with the parent resolved to a name.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent: String,
    pub is_active: bool,
    pub product_count: String,
}

impl CategoryRow {
    /// Rows for every category, parents resolved against the same list.
    #[must_use]
    pub fn list(categories: &[Category]) -> Vec<Self> {
        categories
            .iter()
            .map(|c| Self {
                id: c.id.as_i64(),
                name: c.name.clone(),
                slug: c.slug.clone(),
                parent: c
                    .parent
                    .and_then(|id| categories.iter().find(|p| p.id == id))
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                is_active: c.is_active,
                product_count: c.product_count.map(|n| n.to_string()).unwrap_or_default(),
            })
            .collect()
    }
}

/// `<option>` for a category picker.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

impl CategoryOption {
    /// Options for every category except `exclude` (a category cannot be
    /// its own parent). `selected` is the raw form value.
    #[must_use]
    pub fn list(categories: &[Category], exclude: Option<i64>, selected: &str) -> Vec<Self> {
        categories
            .iter()
            .filter(|c| Some(c.id.as_i64()) != exclude)
            .map(|c| Self {
                id: c.id.as_i64(),
                name: c.name.clone(),
                selected: selected.trim() == c.id.to_string(),
            })
            .collect()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order row in the orders table.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: i64,
    pub number: String,
    pub customer: String,
    pub placed_at: String,
    pub status: &'static str,
    pub badge_class: &'static str,
    pub payment: &'static str,
    pub item_count: u32,
    pub total: String,
}

impl OrderRow {
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode) -> Self {
        let customer = order
            .shipping_address
            .as_ref()
            .map(|a| a.full_name.trim().to_string())
            .filter(|name| !name.is_empty())
            .or_else(|| order.customer_email.clone())
            .unwrap_or_else(|| "Guest".to_string());
        Self {
            id: order.id.as_i64(),
            number: order.display_number(),
            customer,
            placed_at: datetime(order.created_at),
            status: order.status.label(),
            badge_class: order.status.badge_class(),
            payment: order.payment_status.map_or("", |s| s.as_str()),
            item_count: order.item_count(),
            total: money(currency, order.total),
        }
    }

    #[must_use]
    pub fn list(orders: &Page<Order>, currency: CurrencyCode) -> Vec<Self> {
        orders.iter().map(|o| Self::new(o, currency)).collect()
    }
}

/// One line on the order page.
#[derive(Debug, Clone)]
pub struct OrderLineRow {
    pub name: String,
    pub variant: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Order detail page data.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub row: OrderRow,
    pub status: OrderStatus,
    pub customer_id: Option<i64>,
    pub customer_email: String,
    pub lines: Vec<OrderLineRow>,
    pub subtotal: String,
    pub shipping_fee: String,
    pub ship_to: Vec<String>,
    pub updated_at: String,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode) -> Self {
        let ship_to = order
            .shipping_address
            .as_ref()
            .map(|a| {
                let city = match &a.postal_code {
                    Some(code) => format!("{} {code}", a.city),
                    None => a.city.clone(),
                };
                [a.full_name.clone(), a.address.clone(), city, a.phone.clone()]
                    .into_iter()
                    .filter(|s| !s.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let subtotal = order.subtotal.unwrap_or_else(|| {
            order.items.iter().map(glowhaus_core::models::OrderItem::line_total).sum()
        });

        Self {
            row: OrderRow::new(order, currency),
            status: order.status,
            customer_id: order.customer.map(|id| id.as_i64()),
            customer_email: order.customer_email.clone().unwrap_or_default(),
            lines: order
                .items
                .iter()
                .map(|item| OrderLineRow {
                    name: item.product_name.clone(),
                    variant: item.variant_name.clone().unwrap_or_default(),
                    quantity: item.quantity,
                    unit_price: money(currency, item.unit_price),
                    line_total: money(currency, item.line_total()),
                })
                .collect(),
            subtotal: money(currency, subtotal),
            shipping_fee: money(currency, order.shipping_fee.unwrap_or_default()),
            ship_to,
            updated_at: datetime(order.updated_at),
        }
    }
}

// =============================================================================
// Customers
// =============================================================================

/// Customer row in the customers table.
#[derive(Debug, Clone)]
pub struct CustomerRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub joined: String,
    pub order_count: String,
    pub is_active: bool,
    pub is_staff: bool,
}

impl From<&User> for CustomerRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i64(),
            name: user.display_name(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            joined: date(user.date_joined),
            order_count: user.order_count.map(|n| n.to_string()).unwrap_or_default(),
            is_active: user.is_active,
            is_staff: user.is_staff,
        }
    }
}

// =============================================================================
// Content
// =============================================================================

/// Banner row, in display order.
#[derive(Debug, Clone)]
pub struct BannerRow {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub link_url: String,
    pub image: Option<String>,
    pub position: i32,
    pub is_active: bool,
}

impl From<&Banner> for BannerRow {
    fn from(banner: &Banner) -> Self {
        Self {
            id: banner.id.as_i64(),
            title: banner.title.clone(),
            subtitle: banner.subtitle.clone().unwrap_or_default(),
            link_url: banner.link_url.clone().unwrap_or_default(),
            image: banner.image.clone(),
            position: banner.position,
            is_active: banner.is_active,
        }
    }
}

/// Journal entry row; drafts included.
#[derive(Debug, Clone)]
pub struct JournalRow {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub tags: String,
    pub published_on: String,
    pub is_published: bool,
}

impl From<&JournalEntry> for JournalRow {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            slug: entry.slug.clone(),
            title: entry.title.clone(),
            author: entry.author_name.clone().unwrap_or_default(),
            tags: entry.tags.join(", "),
            published_on: date(entry.published_at),
            is_published: entry.is_published,
        }
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Headline figure on the dashboard and report pages.
#[derive(Debug, Clone)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

/// Best seller row.
#[derive(Debug, Clone)]
pub struct TopProductRow {
    pub name: String,
    pub quantity_sold: u64,
    pub revenue: String,
}

/// One bar of the daily revenue chart.
#[derive(Debug, Clone)]
pub struct DayBar {
    pub label: String,
    pub orders: u64,
    pub revenue: String,
    /// Height as a percentage of the best day.
    pub percent: u32,
}

/// Orders in one status.
#[derive(Debug, Clone)]
pub struct StatusCount {
    pub label: &'static str,
    pub badge_class: &'static str,
    pub count: u64,
}

/// Report summary ready for display.
#[derive(Debug, Clone)]
pub struct ReportView {
    pub stats: Vec<StatCard>,
    pub top_products: Vec<TopProductRow>,
    pub daily: Vec<DayBar>,
    pub by_status: Vec<StatusCount>,
}

impl ReportView {
    #[must_use]
    pub fn new(summary: &ReportSummary, currency: CurrencyCode) -> Self {
        let stats = vec![
            StatCard {
                label: "Revenue",
                value: money(currency, summary.total_revenue),
            },
            StatCard {
                label: "Orders",
                value: summary.total_orders.to_string(),
            },
            StatCard {
                label: "Average order",
                value: money(currency, summary.average_order_value),
            },
            StatCard {
                label: "New customers",
                value: summary.new_customers.to_string(),
            },
            StatCard {
                label: "Pending orders",
                value: summary.pending_orders.to_string(),
            },
        ];

        let by_status = summary
            .orders_by_status
            .iter()
            .map(|(status, count)| {
                let status = status.parse::<OrderStatus>().unwrap_or(OrderStatus::Unknown);
                StatusCount {
                    label: status.label(),
                    badge_class: status.badge_class(),
                    count: *count,
                }
            })
            .collect();

        Self {
            stats,
            top_products: summary
                .top_products
                .iter()
                .map(|p| TopProductRow {
                    name: p.name.clone(),
                    quantity_sold: p.quantity_sold,
                    revenue: money(currency, p.revenue),
                })
                .collect(),
            daily: summary
                .daily
                .iter()
                .map(|point| DayBar {
                    label: day_label(point.date),
                    orders: point.orders,
                    revenue: money(currency, point.revenue),
                    percent: summary.bar_percent(point),
                })
                .collect(),
            by_status,
        }
    }
}

fn day_label(date: NaiveDate) -> String {
    date.format("%-d %b").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_listing_url_skips_blank_filters() {
        assert_eq!(listing_url("/orders", &[]), "/orders");
        assert_eq!(
            listing_url("/orders", &[("status", Some("shipped")), ("q", Some("  "))]),
            "/orders?status=shipped"
        );
        assert_eq!(
            listing_url("/customers", &[("q", Some("amina otieno"))]),
            "/customers?q=amina%20otieno"
        );
    }

    #[test]
    fn test_category_rows_resolve_parent() {
        let categories: Vec<Category> = serde_json::from_value(json!([
            {"id": 1, "name": "Skincare", "slug": "skincare"},
            {"id": 2, "name": "Serums", "slug": "serums", "parent": 1, "product_count": 12}
        ]))
        .unwrap();
        let rows = CategoryRow::list(&categories);
        assert_eq!(rows[0].parent, "");
        assert_eq!(rows[1].parent, "Skincare");
        assert_eq!(rows[1].product_count, "12");

        let options = CategoryOption::list(&categories, Some(2), "1");
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].name, "Skincare");
        assert!(options[0].selected);
    }

    #[test]
    fn test_order_row_customer_fallbacks() {
        let order: Order = serde_json::from_value(json!({
            "id": 40,
            "total": "2500.00",
            "customer_email": "amina@example.com",
            "status": "shipped"
        }))
        .unwrap();
        let row = OrderRow::new(&order, CurrencyCode::KES);
        assert_eq!(row.customer, "amina@example.com");
        assert_eq!(row.number, "#40");
        assert_eq!(row.badge_class, "badge--accent");

        let guest: Order = serde_json::from_value(json!({"id": 41, "total": "0"})).unwrap();
        assert_eq!(OrderRow::new(&guest, CurrencyCode::KES).customer, "Guest");
    }

    #[test]
    fn test_order_view_sums_lines_without_subtotal() {
        let order: Order = serde_json::from_value(json!({
            "id": 7,
            "total": "3350.00",
            "shipping_fee": "350.00",
            "items": [
                {"product_name": "Niacinamide Serum", "quantity": 2, "unit_price": "1500.00"}
            ]
        }))
        .unwrap();
        let view = OrderView::new(&order, CurrencyCode::KES);
        assert_eq!(view.subtotal, money(CurrencyCode::KES, Decimal::new(3000, 0)));
        assert_eq!(view.lines.len(), 1);
        assert!(view.ship_to.is_empty());
    }

    #[test]
    fn test_report_view_maps_statuses_and_bars() {
        let summary: ReportSummary = serde_json::from_value(json!({
            "total_revenue": "12000.00",
            "total_orders": 6,
            "orders_by_status": {"delivered": 4, "mystery": 2},
            "daily": [
                {"date": "2026-10-01", "orders": 1, "revenue": "2000.00"},
                {"date": "2026-10-02", "orders": 5, "revenue": "10000.00"}
            ]
        }))
        .unwrap();
        let view = ReportView::new(&summary, CurrencyCode::KES);
        assert_eq!(view.stats.len(), 5);
        assert_eq!(view.daily[0].percent, 20);
        assert_eq!(view.daily[1].percent, 100);
        assert_eq!(view.daily[1].label, "2 Oct");
        assert!(view.by_status.iter().any(|s| s.label == "Delivered" && s.count == 4));
        assert!(view.by_status.iter().any(|s| s.label == "Unknown"));
    }
}
