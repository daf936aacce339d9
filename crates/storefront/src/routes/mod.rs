//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database + API)
//!
//! # Catalog
//! GET  /products               - Product listing (grid fragment for HTMX)
//! GET  /products/:slug         - Product detail
//! GET  /products/:slug/quick-view - Quick view fragment (HTMX)
//! GET  /categories             - Category listing
//! GET  /categories/:slug       - Category detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (cart_items fragment)
//! POST /cart/remove            - Remove line (cart_items fragment)
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Shipping and payment form
//! POST /checkout               - Place order and start payment
//! GET  /checkout/payment/:ref  - Payment waiting page
//! GET  /checkout/payment/:ref/status - Payment status panel (HTMX polling)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Account overview
//! GET  /account/profile        - Profile form
//! POST /account/profile        - Save profile
//! GET  /account/password       - Change password form
//! POST /account/password       - Change password
//! GET  /account/orders         - Order history
//! GET  /account/orders/:id     - Order detail
//! POST /account/orders/:id/pay - Retry payment
//!
//! # Journal
//! GET  /journal                - Journal index
//! GET  /journal/:slug          - Journal entry
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod health;
pub mod home;
pub mod journal;
pub mod products;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Whether the request was made by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Create the auth routes router.
///
/// Credential submissions (POST only) are rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
        .route("/{slug}/quick-view", get(products::quick_view))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(checkout::show).merge(post(checkout::submit).layer(auth_rate_limiter())),
        )
        .route("/payment/{reference}", get(checkout::payment_page))
        .route("/payment/{reference}/status", get(checkout::payment_status))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route(
            "/profile",
            get(account::profile_page).post(account::update_profile),
        )
        .route(
            "/password",
            get(account::password_page)
                .merge(post(account::change_password).layer(auth_rate_limiter())),
        )
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route(
            "/orders/{id}/pay",
            post(checkout::retry).layer(auth_rate_limiter()),
        )
}

/// Create the journal routes router.
pub fn journal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(journal::index))
        .route("/{slug}", get(journal::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
        .nest("/journal", journal_routes())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
