//! Glowhaus API - REST client for the commerce backend.
//!
//! The backend owns pricing, inventory, payments, and order state. This
//! crate is how the storefront, back-office, and CLI talk to it.
//!
//! # Authentication
//!
//! Sign-in returns a JWT access token and a refresh token
//! ([`TokenPair`]). Authenticated calls take a [`TokenStore`] holding the
//! visitor's pair. When the API answers 401 the client renews the pair
//! once and retries once; concurrent renewals for the same refresh token
//! share one request. If renewal is refused the store is cleared and
//! [`ApiError::SessionExpired`] is returned.
//!
//! # Caching
//!
//! Public catalog reads (products, categories, banners, journal, settings)
//! are cached in memory via `moka` for five minutes. Staff writes through
//! this client invalidate its own cache; other processes catch up when
//! their entries expire. [`ApiClient::product_fresh`] skips the cache.
//!
//! # Example
//!
//! ```rust,ignore
//! use glowhaus_api::{ApiClient, ApiConfig, MemoryTokenStore, ProductQuery};
//!
//! let client = ApiClient::new(&ApiConfig::new(base_url))?;
//! let page = client.products(&ProductQuery::featured(8)).await?;
//!
//! let session = client.login("amina@example.com", &password).await?;
//! let store = MemoryTokenStore::with_tokens(session.tokens);
//! let orders = client.my_orders(&store, None).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
mod cache;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod watch;

#[cfg(test)]
mod test_support;

pub use auth::{AccessClaims, MemoryTokenStore, TokenPair, TokenStore};
pub use client::{ApiClient, ApiConfig, ApiRequest};
pub use endpoints::{AuthSession, CustomerQuery, OrderQuery, ProductQuery, Registration};
pub use error::{ApiError, FieldErrors};
pub use watch::{AuthedPaymentSource, PaymentStatusSource, WatchOutcome, watch_payment};
