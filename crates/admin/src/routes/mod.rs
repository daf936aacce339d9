//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (database + API)
//!
//! # Dashboard
//! GET  /                         - 30-day summary and recent orders
//!
//! # Auth (commerce API account with staff access)
//! GET  /auth/login               - Login page
//! POST /auth/login               - Login action (rate limited)
//! POST /auth/logout              - Logout
//!
//! # Catalog
//! GET  /products                 - Product listing (?q=, ?page=)
//! GET  /products/new             - New product form
//! POST /products                 - Create product
//! GET  /products/:slug/edit      - Edit product form
//! POST /products/:slug           - Update product
//! POST /products/:slug/delete    - Delete product
//! GET  /categories               - Category listing
//! GET  /categories/new           - New category form
//! POST /categories               - Create category
//! GET  /categories/:id/edit      - Edit category form
//! POST /categories/:id           - Update category
//! POST /categories/:id/delete    - Delete category
//!
//! # Orders
//! GET  /orders                   - Order listing (?status=, ?q=, ?page=)
//! GET  /orders/:id               - Order detail
//! POST /orders/:id/status        - Change order status
//!
//! # Customers
//! GET  /customers                - Customer listing (?q=, ?page=)
//! GET  /customers/:id            - Customer detail with orders
//!
//! # Content
//! GET  /banners                  - Banner listing
//! GET  /banners/new              - New banner form
//! POST /banners                  - Create banner
//! GET  /banners/:id/edit         - Edit banner form
//! POST /banners/:id              - Update banner
//! POST /banners/:id/delete       - Delete banner
//! GET  /journal                  - Journal listing, drafts included
//! GET  /journal/new              - New entry form
//! POST /journal                  - Create entry
//! GET  /journal/:slug/edit       - Edit entry form
//! POST /journal/:slug            - Update entry
//! POST /journal/:slug/delete     - Delete entry
//!
//! # Reports
//! GET  /reports                  - Sales summary (?period=7d|30d|90d|365d)
//!
//! # Settings
//! GET  /settings                 - Site settings form
//! POST /settings                 - Save site settings
//! ```

pub mod auth;
pub mod banners;
pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod journal;
pub mod orders;
pub mod products;
pub mod reports;
pub mod settings;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Page size requested for product and order listings.
pub const PAGE_SIZE: u32 = 25;

/// The API's own page size, for listings that cannot choose one.
pub const API_PAGE_SIZE: u32 = 20;

/// Create the auth routes router.
///
/// Only the credential submission is rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(login_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/{slug}", post(products::update))
        .route("/{slug}/edit", get(products::edit))
        .route("/{slug}/delete", post(products::delete))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit))
        .route("/{id}/delete", post(categories::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::index))
        .route("/{id}", get(customers::show))
}

/// Create the banner routes router.
pub fn banner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banners::index).post(banners::create))
        .route("/new", get(banners::new))
        .route("/{id}", post(banners::update))
        .route("/{id}/edit", get(banners::edit))
        .route("/{id}/delete", post(banners::delete))
}

/// Create the journal routes router.
pub fn journal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(journal::index).post(journal::create))
        .route("/new", get(journal::new))
        .route("/{slug}", post(journal::update))
        .route("/{slug}/edit", get(journal::edit))
        .route("/{slug}/delete", post(journal::delete))
}

/// Create all routes for the back-office.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/reports", get(reports::index))
        .route("/settings", get(settings::index).post(settings::update))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/orders", order_routes())
        .nest("/customers", customer_routes())
        .nest("/banners", banner_routes())
        .nest("/journal", journal_routes())
}
