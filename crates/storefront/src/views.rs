//! Display data for templates.
//!
//! Templates never format money or dates themselves; handlers convert API
//! models into the view structs here first.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use glowhaus_core::models::{JournalEntry, Order, OrderItem, Page, Product, SiteSettings};
use glowhaus_core::{Cart, CartLine, CartTotals, CurrencyCode, Price};
use rust_decimal::Decimal;
use tower_sessions::Session;

use crate::middleware::{CspNonce, OptionalAuth, load_cart};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Format an amount in the given currency.
#[must_use]
pub fn money(currency: CurrencyCode, amount: Decimal) -> String {
    Price::new(amount, currency).display()
}

/// Format a timestamp as a calendar date, e.g. "3 Mar 2026".
#[must_use]
pub fn date(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%-d %b %Y").to_string())
        .unwrap_or_default()
}

// =============================================================================
// Page chrome
// =============================================================================

/// Everything `base.html` needs: store name, CSP nonce, the signed-in
/// visitor, the bag count, and the announcement bar.
#[derive(Clone)]
pub struct PageContext {
    pub store_name: String,
    pub tagline: Option<String>,
    pub announcement: Option<String>,
    pub instagram_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub nonce: String,
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub currency: CurrencyCode,
    /// Request path, for highlighting the active nav link.
    pub path: String,
}

impl PageContext {
    /// Format an amount in the store currency.
    #[must_use]
    pub fn money(&self, amount: Decimal) -> String {
        money(self.currency, amount)
    }

    /// Whether the nav link for `prefix` is the current section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.path == "/"
        } else {
            self.path.starts_with(prefix)
        }
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nonce = parts
            .extensions
            .get::<CspNonce>()
            .map(|n| n.value().to_string())
            .unwrap_or_default();
        let Ok(OptionalAuth(user)) = OptionalAuth::from_request_parts(parts, state).await;
        let cart_count = match parts.extensions.get::<Session>() {
            Some(session) => load_cart(session).await.item_count(),
            None => 0,
        };
        let settings = state.site_settings().await;
        let config = state.config();

        Ok(Self {
            store_name: settings
                .store_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| config.store.name.clone()),
            tagline: settings.tagline,
            announcement: settings.announcement.filter(|a| !a.trim().is_empty()),
            instagram_url: settings.instagram_url,
            tiktok_url: settings.tiktok_url,
            nonce,
            user,
            cart_count,
            currency: config.store.currency,
            path: parts.uri.path().to_string(),
        })
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product tile on listings.
#[derive(Clone)]
pub struct ProductCard {
    pub slug: String,
    pub name: String,
    pub brand: Option<String>,
    pub category_name: Option<String>,
    pub price: String,
    /// Struck-through original price when on sale.
    pub compare_at_price: Option<String>,
    pub image: Option<String>,
    pub in_stock: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            slug: product.slug.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category_name: product.category_name.clone(),
            price: money(currency, product.price),
            compare_at_price: product
                .is_on_sale()
                .then(|| product.compare_at_price.map(|p| money(currency, p)))
                .flatten(),
            image: product.primary_image().map(str::to_string),
            in_stock: product.in_stock,
        }
    }

    #[must_use]
    pub fn list(products: &[Product], currency: CurrencyCode) -> Vec<Self> {
        products.iter().map(|p| Self::new(p, currency)).collect()
    }
}

/// A purchasable option on the product page.
#[derive(Clone)]
pub struct VariantOption {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub in_stock: bool,
}

/// Full product page data.
#[derive(Clone)]
pub struct ProductDetail {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub brand: Option<String>,
    pub category_name: Option<String>,
    pub short_description: Option<String>,
    pub description: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub images: Vec<String>,
    pub variants: Vec<VariantOption>,
    pub in_stock: bool,
}

impl ProductDetail {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        let primary = product.primary_image();
        let images: Vec<String> = primary
            .into_iter()
            .chain(
                product
                    .images
                    .iter()
                    .map(|img| img.image.as_str())
                    .filter(|url| Some(*url) != primary),
            )
            .map(str::to_string)
            .collect();

        Self {
            id: product.id.as_i64(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category_name: product.category_name.clone(),
            short_description: product.short_description.clone(),
            description: product.description.clone(),
            price: money(currency, product.price),
            compare_at_price: product
                .is_on_sale()
                .then(|| product.compare_at_price.map(|p| money(currency, p)))
                .flatten(),
            images,
            variants: product
                .active_variants()
                .map(|v| VariantOption {
                    id: v.id.as_i64(),
                    name: v.name.clone(),
                    price: money(currency, product.price_for(Some(v))),
                    in_stock: v.in_stock,
                })
                .collect(),
            in_stock: product.in_stock,
        }
    }
}

/// Previous/next links for a paginated listing.
#[derive(Clone, Default)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u64,
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
            prev_url: (results.has_previous() && page > 1).then(|| link(page - 1)),
            next_url: results.has_next().then(|| link(page + 1)),
        }
    }

    #[must_use]
    pub const fn is_needed(&self) -> bool {
        self.prev_url.is_some() || self.next_url.is_some()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One bag line for display.
#[derive(Clone)]
pub struct CartLineView {
    /// Line key as submitted back by the update/remove forms.
    pub key: String,
    pub slug: String,
    pub name: String,
    pub variant_label: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image: Option<String>,
}

impl CartLineView {
    fn new(line: &CartLine, currency: CurrencyCode) -> Self {
        Self {
            key: line.key().to_string(),
            slug: line.slug.clone(),
            name: line.name.clone(),
            variant_label: line.variant_label.clone(),
            quantity: line.quantity,
            unit_price: money(currency, line.unit_price),
            line_total: money(currency, line.line_total()),
            image: line.image_url.clone(),
        }
    }
}

/// Bag contents with totals.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub free_shipping: bool,
    pub total: String,
    /// "Spend X more for free delivery" amount, when a threshold applies.
    pub free_shipping_remaining: Option<String>,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, settings: &SiteSettings, currency: CurrencyCode) -> Self {
        let totals = CartTotals::compute(cart, &settings.shipping_rates());
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView::new(line, currency))
                .collect(),
            item_count: totals.item_count,
            subtotal: money(currency, totals.subtotal),
            shipping: money(currency, totals.shipping),
            free_shipping: totals.shipping.is_zero(),
            total: money(currency, totals.total),
            free_shipping_remaining: totals
                .free_shipping_remaining
                .filter(|r| !r.is_zero() && !cart.is_empty())
                .map(|r| money(currency, r)),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Row in the order history.
#[derive(Clone)]
pub struct OrderSummary {
    pub id: i64,
    pub number: String,
    pub placed_on: String,
    pub status: &'static str,
    pub badge_class: &'static str,
    pub item_count: u32,
    pub total: String,
    pub awaiting_payment: bool,
}

impl OrderSummary {
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode) -> Self {
        Self {
            id: order.id.as_i64(),
            number: order.display_number(),
            placed_on: date(order.created_at),
            status: order.status.label(),
            badge_class: order.status.badge_class(),
            item_count: order.item_count(),
            total: money(currency, order.total),
            awaiting_payment: order.awaiting_payment(),
        }
    }
}

/// Order line for display.
#[derive(Clone)]
pub struct OrderLineView {
    pub name: String,
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl OrderLineView {
    fn new(item: &OrderItem, currency: CurrencyCode) -> Self {
        Self {
            name: item.product_name.clone(),
            variant_name: item.variant_name.clone(),
            quantity: item.quantity,
            unit_price: money(currency, item.unit_price),
            line_total: money(currency, item.line_total()),
        }
    }
}

/// Full order page data.
#[derive(Clone)]
pub struct OrderDetail {
    pub summary: OrderSummary,
    pub lines: Vec<OrderLineView>,
    pub subtotal: Option<String>,
    pub shipping_fee: Option<String>,
    pub payment_status: Option<&'static str>,
    pub ship_to: Vec<String>,
}

impl OrderDetail {
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode) -> Self {
        let ship_to = order
            .shipping_address
            .as_ref()
            .map(|a| {
                [
                    Some(a.full_name.clone()),
                    Some(a.address.clone()),
                    Some(match &a.postal_code {
                        Some(code) => format!("{} {code}", a.city),
                        None => a.city.clone(),
                    }),
                    Some(a.phone.clone()),
                ]
                .into_iter()
                .flatten()
                .filter(|s| !s.trim().is_empty())
                .collect()
            })
            .unwrap_or_default();

        Self {
            summary: OrderSummary::new(order, currency),
            lines: order
                .items
                .iter()
                .map(|item| OrderLineView::new(item, currency))
                .collect(),
            subtotal: order.subtotal.map(|s| money(currency, s)),
            shipping_fee: order.shipping_fee.map(|s| money(currency, s)),
            payment_status: order.payment_status.map(|s| s.as_str()),
            ship_to,
        }
    }
}

// =============================================================================
// Journal
// =============================================================================

/// Journal post teaser.
#[derive(Clone)]
pub struct JournalCard {
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published_on: String,
    pub reading_minutes: usize,
}

impl From<&JournalEntry> for JournalCard {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            slug: entry.slug.clone(),
            title: entry.title.clone(),
            excerpt: entry.excerpt.clone(),
            cover_image: entry.cover_image.clone(),
            published_on: date(entry.published_at),
            reading_minutes: entry.reading_minutes(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glowhaus_core::ProductId;

    use super::*;

    fn line(id: i64, price: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            variant_id: None,
            slug: format!("product-{id}"),
            name: format!("Product {id}"),
            variant_label: None,
            unit_price: Decimal::new(price, 0),
            quantity,
            image_url: None,
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let mut cart = Cart::default();
        cart.add(line(1, 1200, 2));
        cart.add(line(2, 800, 1));
        let settings = SiteSettings {
            shipping_fee: Decimal::new(300, 0),
            free_shipping_threshold: Some(Decimal::new(5000, 0)),
            ..SiteSettings::default()
        };

        let view = CartView::new(&cart, &settings, CurrencyCode::KES);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.subtotal, money(CurrencyCode::KES, Decimal::new(3200, 0)));
        assert_eq!(view.total, money(CurrencyCode::KES, Decimal::new(3500, 0)));
        assert!(!view.free_shipping);
        assert_eq!(
            view.free_shipping_remaining,
            Some(money(CurrencyCode::KES, Decimal::new(1800, 0)))
        );
    }

    #[test]
    fn test_empty_cart_has_no_free_shipping_nudge() {
        let settings = SiteSettings {
            free_shipping_threshold: Some(Decimal::new(5000, 0)),
            ..SiteSettings::default()
        };
        let view = CartView::new(&Cart::default(), &settings, CurrencyCode::KES);
        assert!(view.is_empty());
        assert_eq!(view.free_shipping_remaining, None);
    }

    #[test]
    fn test_pagination_links() {
        let page = Page {
            count: 30,
            next: Some("https://api.example.com/api/products/?page=3".to_string()),
            previous: Some("https://api.example.com/api/products/?page=1".to_string()),
            results: vec![1, 2, 3],
        };
        let pagination = Pagination::new(&page, 2, 12, "/products?sort=newest");
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.prev_url.as_deref(), Some("/products?sort=newest&page=1"));
        assert_eq!(pagination.next_url.as_deref(), Some("/products?sort=newest&page=3"));

        let single = Page::from_vec(vec![1]);
        assert!(!Pagination::new(&single, 1, 12, "/journal").is_needed());
    }

    #[test]
    fn test_date_format() {
        let at = "2026-03-03T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(date(Some(at)), "3 Mar 2026");
        assert_eq!(date(None), "");
    }
}
