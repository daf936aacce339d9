//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Server-side failures
//! are captured to Sentry before responding; an expired session becomes a
//! sign-in redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use glowhaus_api::ApiError;
use glowhaus_core::CartError;
use thiserror::Error;

use crate::middleware::login_required;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Minimal error page. Does not extend `base.html`, which needs request
/// context that may be what failed.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: &'static str,
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) => match err {
                ApiError::NotFound => StatusCode::NOT_FOUND,
                ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
                ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                ApiError::Validation(_) => StatusCode::BAD_REQUEST,
                ApiError::Unauthenticated
                | ApiError::Unauthorized
                | ApiError::SessionExpired
                | ApiError::MissingTokens => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) | Self::Cart(CartError::LineNotFound(_)) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Cart(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the visitor has to sign in again to continue.
    #[must_use]
    pub fn needs_login(&self) -> bool {
        matches!(self, Self::Api(err) if err.needs_login() || matches!(err, ApiError::MissingTokens))
    }

    fn title(&self) -> &'static str {
        match self.status() {
            StatusCode::NOT_FOUND => "Page not found",
            StatusCode::UNAUTHORIZED => "Please sign in",
            StatusCode::FORBIDDEN => "Not allowed",
            StatusCode::TOO_MANY_REQUESTS => "Slow down",
            StatusCode::BAD_REQUEST => "Something's not right",
            StatusCode::BAD_GATEWAY => "We couldn't reach the shop",
            _ => "Something went wrong",
        }
    }

    /// Message safe to show the visitor.
    fn public_message(&self) -> String {
        match self {
            Self::Api(ApiError::NotFound) => "We couldn't find what you were looking for.".to_string(),
            Self::Api(ApiError::RateLimited(secs)) => {
                format!("Too many requests. Please try again in {secs} seconds.")
            }
            Self::Api(ApiError::Validation(errors)) => errors.to_string(),
            Self::Api(ApiError::Forbidden(detail)) if !detail.is_empty() => detail.clone(),
            Self::Api(_) => {
                "Our shop is having trouble right now. Please try again in a moment.".to_string()
            }
            Self::NotFound(what) => format!("We couldn't find {what}."),
            Self::BadRequest(msg) => msg.clone(),
            Self::Cart(err) => err.to_string(),
            Self::Session(_) | Self::Internal(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.needs_login() {
            return login_required();
        }

        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let page = ErrorTemplate {
            status: status.as_u16(),
            title: self.title(),
            message: self.public_message(),
        };
        let mut response = (status, page).into_response();

        if let Self::Api(ApiError::RateLimited(secs)) = &self
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }

        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use glowhaus_api::FieldErrors;
    use glowhaus_core::{CartLineKey, ProductId};

    use super::*;
    use crate::middleware::LoginRequired;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(get_status(AppError::NotFound("x".to_string())), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AppError::Api(ApiError::NotFound)), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(AppError::Api(ApiError::Forbidden(String::new()))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Validation(FieldErrors::new()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Upstream {
                status: 500,
                body: String::new()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::LineNotFound(CartLineKey::new(
                ProductId::new(1),
                None
            )))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::Api(ApiError::RateLimited(12)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()), Some("12"));
    }

    #[test]
    fn test_expired_session_asks_for_login() {
        for err in [ApiError::SessionExpired, ApiError::Unauthenticated] {
            let response = AppError::Api(err).into_response();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert!(response.extensions().get::<LoginRequired>().is_some());
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("db password is hunter2".to_string());
        assert!(!err.public_message().contains("hunter2"));
    }
}
