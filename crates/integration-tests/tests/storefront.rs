//! End-to-end tests for the storefront.
//!
//! These tests require:
//! - The storefront running (`cargo run -p glowhaus-storefront`)
//! - Its session table (`cargo run -p glowhaus-cli -- migrate storefront`)
//! - A reachable commerce API with at least one product

#![allow(clippy::unwrap_used)]

use glowhaus_integration_tests::{client, location, required_env, shopper_client, storefront_url};
use reqwest::StatusCode;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_health() {
    let response = client()
        .get(format!("{}/health", storefront_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront, database, and API"]
async fn test_readiness_reports_dependencies() {
    let response = client()
        .get(format!("{}/health/ready", storefront_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["database"], true);
    assert_eq!(body["api"], true);
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and API"]
async fn test_home_and_catalog_pages_render() {
    let client = client();
    let base = storefront_url();

    for path in ["/", "/products", "/categories", "/journal"] {
        let response = client
            .get(format!("{base}{path}"))
            .send()
            .await
            .expect("Failed to reach storefront");
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        let body = response.text().await.unwrap();
        assert!(body.contains("<html"), "GET {path} did not render a page");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and API"]
async fn test_product_grid_fragment_for_htmx() {
    let response = client()
        .get(format!("{}/products?page=1", storefront_url()))
        .header("HX-Request", "true")
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(!body.contains("<html"), "HTMX request should get a fragment");
}

#[tokio::test]
#[ignore = "Requires running storefront and API"]
async fn test_unknown_product_is_not_found() {
    let response = client()
        .get(format!("{}/products/no-such-product-slug", storefront_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront, API, and TEST_PRODUCT_SLUG"]
async fn test_cart_add_update_remove() {
    let client = client();
    let base = storefront_url();
    let slug = required_env("TEST_PRODUCT_SLUG");

    let response = client
        .post(format!("{base}/cart/add"))
        .header("HX-Request", "true")
        .form(&[("slug", slug.as_str()), ("quantity", "2")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("HX-Trigger").and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">2<"), "cart count was {count}");

    let cart = client.get(format!("{base}/cart")).send().await.unwrap();
    assert_eq!(cart.status(), StatusCode::OK);
    assert!(cart.text().await.unwrap().contains(&slug));

    let response = client
        .post(format!("{base}/cart/clear"))
        .send()
        .await
        .expect("Failed to clear cart");
    assert!(response.status().is_redirection() || response.status().is_success());

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!count.contains("badge"), "cart should be empty, got {count}");
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_add_to_cart_without_product_is_rejected() {
    let response = client()
        .post(format!("{}/cart/add", storefront_url()))
        .form(&[("quantity", "1")])
        .send()
        .await
        .expect("Failed to reach storefront");

    assert!(response.status().is_client_error());
}

// ============================================================================
// Auth and account
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_checkout_requires_login() {
    let response = client()
        .get(format!("{}/checkout", storefront_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response).as_deref(),
        Some("/auth/login?next=%2Fcheckout")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_account_requires_login() {
    let response = client()
        .get(format!("{}/account/orders", storefront_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert!(response.status().is_redirection());
    assert!(location(&response).unwrap().starts_with("/auth/login"));
}

#[tokio::test]
#[ignore = "Requires running storefront and API"]
async fn test_bad_login_shows_form_again() {
    let response = client()
        .post(format!("{}/auth/login", storefront_url()))
        .form(&[("email", "nobody@example.com"), ("password", "wrong-password")])
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("name=\"email\""));
}

#[tokio::test]
#[ignore = "Requires running storefront, API, and a test shopper account"]
async fn test_shopper_sees_account_and_orders() {
    let client = shopper_client().await;
    let base = storefront_url();

    for path in ["/account", "/account/orders", "/account/profile"] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
    }

    let response = client.post(format!("{base}/auth/logout")).send().await.unwrap();
    assert!(response.status().is_redirection());

    let response = client.get(format!("{base}/account")).send().await.unwrap();
    assert!(response.status().is_redirection(), "session should be gone after logout");
}
