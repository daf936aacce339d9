//! Session middleware configuration and session-backed state.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions, and stores
//! the visitor's API tokens and cart in them.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use glowhaus_api::{TokenPair, TokenStore};
use glowhaus_core::Cart;
use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "glowhaus_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    // The sessions table is created by `glowhaus-cli migrate storefront`
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

// =============================================================================
// Token store
// =============================================================================

/// The visitor's API token pair, kept in their session.
///
/// Session storage failures are logged and otherwise ignored: a lost save
/// costs one extra refresh on the next request.
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
        // Without tokens the visitor is signed out, so drop the identity too
        for key in [session_keys::TOKENS, session_keys::CURRENT_USER] {
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

// =============================================================================
// Cart
// =============================================================================

/// Load the visitor's cart. A missing or unreadable cart is empty.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read cart from session, starting empty");
            Cart::default()
        }
    }
}

/// Persist the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}
