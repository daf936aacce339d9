//! End-to-end tests for the Glowhaus storefront and back-office.
//!
//! The tests drive running servers over HTTP, so they are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p glowhaus-storefront &
//! cargo run -p glowhaus-admin &
//! cargo test -p glowhaus-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `STOREFRONT_BASE_URL` - defaults to `http://localhost:3000`
//! - `ADMIN_BASE_URL` - defaults to `http://localhost:3001`
//! - `TEST_SHOPPER_EMAIL` / `TEST_SHOPPER_PASSWORD` - a shopper account
//! - `TEST_STAFF_EMAIL` / `TEST_STAFF_PASSWORD` - a staff account
//! - `TEST_PRODUCT_SLUG` - a product that is in stock

#![allow(clippy::missing_panics_doc)]

use reqwest::{Client, redirect::Policy};

/// Base URL for the storefront.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the back-office.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Read a required test variable.
#[must_use]
pub fn required_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set for integration tests"))
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location`.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// The `Location` header of a redirect, if any.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Sign in to the storefront as the test shopper.
pub async fn shopper_client() -> Client {
    let client = client();
    let response = client
        .post(format!("{}/auth/login", storefront_url()))
        .form(&[
            ("email", required_env("TEST_SHOPPER_EMAIL")),
            ("password", required_env("TEST_SHOPPER_PASSWORD")),
        ])
        .send()
        .await
        .expect("Failed to submit storefront login");
    assert!(
        response.status().is_redirection(),
        "storefront login failed with {}",
        response.status()
    );
    client
}

/// Sign in to the back-office as the test staff member.
pub async fn staff_client() -> Client {
    let client = client();
    let response = client
        .post(format!("{}/auth/login", admin_url()))
        .form(&[
            ("email", required_env("TEST_STAFF_EMAIL")),
            ("password", required_env("TEST_STAFF_PASSWORD")),
        ])
        .send()
        .await
        .expect("Failed to submit admin login");
    assert_eq!(location(&response).as_deref(), Some("/"), "staff login was not accepted");
    client
}
