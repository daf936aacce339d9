//! Session table migrations.
//!
//! Neither web app owns any tables of its own; the only persisted state is
//! the tower-sessions store. These commands create it.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront sessions (falls back to `DATABASE_URL`)
//! - `ADMIN_DATABASE_URL` - back-office sessions (falls back to `DATABASE_URL`)

use glowhaus_admin::db::{SESSION_SCHEMA, SESSION_TABLE};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CliError, first_env};

async fn connect(database_url: &SecretString) -> Result<PgPool, CliError> {
    Ok(PgPool::connect(database_url.expose_secret()).await?)
}

/// Create the storefront session table (`tower_sessions.session`).
///
/// # Errors
///
/// Returns an error if no database URL is set or the migration fails.
pub async fn storefront() -> Result<(), CliError> {
    let database_url = first_env(&["STOREFRONT_DATABASE_URL", "DATABASE_URL"])?;

    tracing::info!("Connecting to storefront database...");
    let pool = connect(&database_url).await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront sessions ready");
    Ok(())
}

/// Create the back-office session table (`admin.session`).
///
/// # Errors
///
/// Returns an error if no database URL is set or the migration fails.
pub async fn admin() -> Result<(), CliError> {
    let database_url = first_env(&["ADMIN_DATABASE_URL", "DATABASE_URL"])?;

    tracing::info!("Connecting to admin database...");
    let pool = connect(&database_url).await?;

    tracing::info!(schema = SESSION_SCHEMA, table = SESSION_TABLE, "Creating admin session table...");
    PostgresStore::new(pool)
        .with_schema_name(SESSION_SCHEMA)
        .map_err(CliError::SessionStore)?
        .with_table_name(SESSION_TABLE)
        .map_err(CliError::SessionStore)?
        .migrate()
        .await?;

    tracing::info!("Admin sessions ready");
    Ok(())
}
