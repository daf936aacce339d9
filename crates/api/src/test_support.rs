//! In-process fake of the commerce API for client tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use url::Url;

use crate::auth::TokenPair;
use crate::client::{ApiClient, ApiConfig};

static TOKEN_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Sign an access token for `user_id` expiring `exp_offset` seconds from now.
pub fn access_token(user_id: i64, exp_offset: i64) -> String {
    let claims = json!({
        "token_type": "access",
        "user_id": user_id,
        "exp": chrono::Utc::now().timestamp() + exp_offset,
        "jti": TOKEN_SERIAL.fetch_add(1, Ordering::SeqCst),
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"fake-backend-secret"),
    )
    .unwrap()
}

pub struct FakeState {
    pub refresh_calls: AtomicUsize,
    pub order_calls: AtomicUsize,
    pub product_calls: AtomicUsize,
    /// The only access token the fake accepts.
    pub valid_access: String,
}

pub struct FakeApi {
    pub client: ApiClient,
    pub state: Arc<FakeState>,
}

impl FakeApi {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            refresh_calls: AtomicUsize::new(0),
            order_calls: AtomicUsize::new(0),
            product_calls: AtomicUsize::new(0),
            valid_access: access_token(7, 3600),
        });

        let routes = Router::new()
            .route("/auth/login/", post(login))
            .route("/auth/register/", post(register))
            .route("/auth/logout/", post(logout))
            .route("/auth/token/refresh/", post(refresh))
            .route("/orders/orders/", get(orders))
            .route("/products/products/", get(products))
            .route("/products/products/{slug}/", get(product).delete(delete_product))
            .route("/always-401/", get(|| async { StatusCode::UNAUTHORIZED }))
            .route("/status/{code}/", any(status));
        let app = Router::new().nest("/api", routes).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = Url::parse(&format!("http://{addr}/api/")).unwrap();
        let client = ApiClient::new(&ApiConfig::new(base_url)).unwrap();

        Self { client, state }
    }

    /// Tokens the fake accepts as-is.
    pub fn valid_pair(&self) -> TokenPair {
        TokenPair::new(self.state.valid_access.clone(), "refresh-1".to_owned())
    }

    /// An unexpired access token the fake refuses, with the given refresh token.
    pub fn revoked_pair(&self, refresh: &str) -> TokenPair {
        TokenPair::new(access_token(7, 3600), refresh.to_owned())
    }
}

fn authorized(state: &FakeState, headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", state.valid_access))
}

async fn login(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Response {
    if body["password"] != "correct-horse" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response();
    }
    Json(json!({
        "access": state.valid_access,
        "refresh": "refresh-1",
        "user": {"id": 7, "email": body["email"]}
    }))
    .into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({"id": 7, "email": body["email"]})),
    )
        .into_response()
}

async fn logout(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> StatusCode {
    if authorized(&state, &headers) {
        StatusCode::RESET_CONTENT
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn refresh(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;

    if body["refresh"] == "unavailable" {
        return (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response();
    }
    if body["refresh"] == "revoked" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is blacklisted", "code": "token_not_valid"})),
        )
            .into_response();
    }
    Json(json!({"access": state.valid_access, "refresh": "refresh-rotated"})).into_response()
}

async fn orders(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.order_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([{"id": 1, "total": "10.00"}])).into_response()
}

async fn products(State(state): State<Arc<FakeState>>) -> Json<Value> {
    state.product_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "count": 1,
        "next": null,
        "previous": null,
        "results": [{
            "id": 12,
            "name": "Vitamin C Serum",
            "slug": "vitamin-c-serum",
            "price": "2400.00"
        }]
    }))
}

async fn product(State(state): State<Arc<FakeState>>, Path(slug): Path<String>) -> Response {
    state.product_calls.fetch_add(1, Ordering::SeqCst);
    if slug != "vitamin-c-serum" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response();
    }
    Json(json!({
        "id": 12,
        "name": "Vitamin C Serum",
        "slug": "vitamin-c-serum",
        "price": "2400.00"
    }))
    .into_response()
}

async fn delete_product(
    State(state): State<Arc<FakeState>>,
    Path(_slug): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    if authorized(&state, &headers) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn status(Path(code): Path<u16>) -> Response {
    match code {
        400 => (
            StatusCode::BAD_REQUEST,
            Json(json!({"email": ["Enter a valid email address."]})),
        )
            .into_response(),
        404 => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
        429 => (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "7")], "slow down").into_response(),
        204 => StatusCode::NO_CONTENT.into_response(),
        _ => (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response(),
    }
}
