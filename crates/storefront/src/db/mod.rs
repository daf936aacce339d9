//! Session database for the storefront.
//!
//! # Database: `glowhaus_storefront`
//!
//! Holds only the `tower_sessions.session` table. Products, orders, and
//! accounts belong to the commerce API. A visitor's session carries their
//! token pair, cart, and any payment being watched.
//!
//! The table is created by:
//! ```bash
//! cargo run -p glowhaus-cli -- migrate storefront
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool for session storage.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Check the pool can serve a query.
pub async fn is_ready(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}
