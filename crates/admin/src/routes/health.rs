//! Health check endpoints.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

/// Dependency status reported by the readiness probe.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Readiness {
    pub database: bool,
    pub api: bool,
}

impl Readiness {
    fn status(&self) -> StatusCode {
        if self.database && self.api {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 when the session database or the commerce API is not
/// reachable.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let (database, api) = tokio::join!(db::is_ready(state.pool()), state.api().ping());
    let api = api
        .inspect_err(|e| tracing::warn!(error = %e, "Commerce API is not reachable"))
        .is_ok();
    let readiness = Readiness { database, api };
    (readiness.status(), Json(readiness))
}
