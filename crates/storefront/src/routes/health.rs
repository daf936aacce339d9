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
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.database && self.api
    }

    fn status(&self) -> StatusCode {
        if self.is_ready() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Liveness: the process is serving requests. Checks nothing else.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: the session database and the commerce API both answer.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let (database, api) = tokio::join!(db::is_ready(state.pool()), state.api().ping());
    let readiness = Readiness {
        database,
        api: match api {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Commerce API is not reachable");
                false
            }
        },
    };
    (readiness.status(), Json(readiness))
}
