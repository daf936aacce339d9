//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! stricter settings than the storefront (SameSite=Strict, 12hr expiry),
//! and keeps the staff member's API tokens in them.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use glowhaus_api::{TokenPair, TokenStore};
use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;
use crate::db::{SESSION_SCHEMA, SESSION_TABLE};
use crate::models::session_keys;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "glowhaus_admin_session";

/// Session expiry time in seconds (12 hours).
const SESSION_EXPIRY_SECONDS: i64 = 12 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// # Panics
///
/// Panics if the schema or table name is invalid, which cannot happen
/// with the constant names used here.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore> {
    // The table is created by `glowhaus-cli migrate admin`
    let store = PostgresStore::new(pool.clone())
        .with_schema_name(SESSION_SCHEMA)
        .expect("valid schema name")
        .with_table_name(SESSION_TABLE)
        .expect("valid table name");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// The staff member's API token pair, kept in their session.
#[derive(Clone)]
pub struct SessionTokenStore {
    session: Session,
}

impl SessionTokenStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

impl TokenStore for SessionTokenStore {
    async fn load(&self) -> Option<TokenPair> {
        match self.session.get::<TokenPair>(session_keys::TOKENS).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read tokens from session");
                None
            }
        }
    }

    async fn save(&self, tokens: &TokenPair) {
        if let Err(e) = self.session.insert(session_keys::TOKENS, tokens).await {
            tracing::error!(error = %e, "Failed to save tokens to session");
        }
    }

    async fn clear(&self) {
        for key in [session_keys::TOKENS, session_keys::CURRENT_STAFF] {
            if let Err(e) = self.session.remove_value(key).await {
                tracing::error!(error = %e, key, "Failed to clear session value");
            }
        }
    }
}

impl<S> FromRequestParts<S> for SessionTokenStore
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::new(session))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use glowhaus_core::UserId;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::models::CurrentStaff;

    #[tokio::test]
    async fn test_clear_signs_staff_out() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let store = SessionTokenStore::new(session.clone());

        store
            .save(&TokenPair::new("access".to_string(), "refresh".to_string()))
            .await;
        session
            .insert(
                session_keys::CURRENT_STAFF,
                CurrentStaff {
                    id: UserId::new(1),
                    email: "ops@glowhaus.co".to_string(),
                    name: "Ops".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(store.load().await.is_some());

        store.clear().await;
        assert!(store.load().await.is_none());
        assert!(
            session
                .get::<CurrentStaff>(session_keys::CURRENT_STAFF)
                .await
                .unwrap()
                .is_none()
        );
    }
}
