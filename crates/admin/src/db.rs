//! Session database for the back-office.
//!
//! # Database: `glowhaus_admin` (separate from the storefront)
//!
//! Holds only the `admin.session` table; staff accounts live in the
//! commerce API. Created by:
//! ```bash
//! cargo run -p glowhaus-cli -- migrate admin
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Schema the session table lives in.
pub const SESSION_SCHEMA: &str = "admin";

/// Session table name.
pub const SESSION_TABLE: &str = "session";

/// Create a `PostgreSQL` connection pool for session storage.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Check the pool can serve a query.
pub async fn is_ready(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}
