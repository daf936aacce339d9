//! End-to-end tests for the back-office.
//!
//! These tests require:
//! - The back-office running (`cargo run -p glowhaus-admin`)
//! - Its session table (`cargo run -p glowhaus-cli -- migrate admin`)
//! - A reachable commerce API and a staff account for the signed-in tests

#![allow(clippy::unwrap_used)]

use glowhaus_integration_tests::{admin_url, client, location, staff_client};
use reqwest::StatusCode;

// ============================================================================
// Health and security headers
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health() {
    let response = client()
        .get(format!("{}/health", admin_url()))
        .send()
        .await
        .expect("Failed to reach admin");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("x-frame-options").and_then(|v| v.to_str().ok()),
        Some("DENY")
    );
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_pages_require_staff_login() {
    let client = client();
    let base = admin_url();

    for path in ["/", "/products", "/orders", "/customers", "/reports", "/settings"] {
        let response = client
            .get(format!("{base}{path}"))
            .send()
            .await
            .expect("Failed to reach admin");
        assert!(response.status().is_redirection(), "GET {path} was {}", response.status());
        assert_eq!(location(&response).as_deref(), Some("/auth/login"), "GET {path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_login_page_renders() {
    let response = client()
        .get(format!("{}/auth/login", admin_url()))
        .send()
        .await
        .expect("Failed to reach admin");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("name=\"password\""));
}

#[tokio::test]
#[ignore = "Requires running admin server and API"]
async fn test_bad_credentials_are_rejected() {
    let response = client()
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", "nobody@example.com"), ("password", "wrong-password")])
        .send()
        .await
        .expect("Failed to reach admin");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("don&#x27;t match") || body.contains("don't match"));
}

#[tokio::test]
#[ignore = "Requires running admin server, API, and a staff account"]
async fn test_staff_login_and_logout() {
    let client = staff_client().await;
    let base = admin_url();

    let response = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get(format!("{base}/auth/login")).send().await.unwrap();
    assert_eq!(location(&response).as_deref(), Some("/"), "signed-in staff skip the login page");

    let response = client.post(format!("{base}/auth/logout")).send().await.unwrap();
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));

    let response = client.get(format!("{base}/")).send().await.unwrap();
    assert!(response.status().is_redirection());
}

// ============================================================================
// Signed-in pages
// ============================================================================

// Staff logins are rate limited (bursts of 3), so the signed-in checks
// share one session.
#[tokio::test]
#[ignore = "Requires running admin server, API, and a staff account"]
async fn test_signed_in_pages() {
    let client = staff_client().await;
    let base = admin_url();

    for path in [
        "/products",
        "/products?q=serum&page=1",
        "/categories",
        "/orders",
        "/orders?status=pending",
        "/orders?status=not-a-status",
        "/customers",
        "/banners",
        "/journal",
        "/settings",
    ] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
    }

    for period in ["7d", "30d", "90d", "365d"] {
        let response = client
            .get(format!("{base}/reports?period={period}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "period {period}");
    }
    let response = client
        .get(format!("{base}/reports?period=forever"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{base}/products"))
        .form(&[("name", ""), ("slug", "Not A Slug"), ("price", "-3")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("field-error"), "invalid product form should be shown again");
}
