//! Authentication extractors for the back-office.
//!
//! Every page except `/auth/login` and the health checks requires a staff
//! member in the session.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentStaff, session_keys};

/// Extractor that requires a signed-in staff member.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireStaff(staff): RequireStaff) -> impl IntoResponse {
///     format!("Hello, {}!", staff.name)
/// }
/// ```
pub struct RequireStaff(pub CurrentStaff);

/// Error returned when a staff member is required but nobody is signed in.
#[derive(Debug)]
pub enum StaffAuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// The session layer is missing.
    NoSession,
}

impl IntoResponse for StaffAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::NoSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = StaffAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(StaffAuthRejection::NoSession)?;

        let staff = current_staff(session)
            .await
            .ok_or(StaffAuthRejection::RedirectToLogin)?;

        Ok(Self(staff))
    }
}

/// Extractor that optionally gets the signed-in staff member.
pub struct OptionalStaff(pub Option<CurrentStaff>);

impl<S> FromRequestParts<S> for OptionalStaff
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let staff = match parts.extensions.get::<Session>() {
            Some(session) => current_staff(session).await,
            None => None,
        };

        Ok(Self(staff))
    }
}

async fn current_staff(session: &Session) -> Option<CurrentStaff> {
    session
        .get::<CurrentStaff>(session_keys::CURRENT_STAFF)
        .await
        .ok()
        .flatten()
}

/// Helper to set the signed-in staff member in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_staff(
    session: &Session,
    staff: &CurrentStaff,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_STAFF, staff).await
}

/// Queue a confirmation message for the next rendered page.
///
/// Failures are logged; a lost message is not worth failing the request.
pub async fn set_flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(session_keys::FLASH, message.into()).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the queued confirmation message, if any.
pub async fn take_flash(session: &Session) -> Option<String> {
    session
        .remove::<String>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use glowhaus_core::UserId;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let session = session();
        assert_eq!(take_flash(&session).await, None);

        set_flash(&session, "Product saved.").await;
        assert_eq!(take_flash(&session).await.as_deref(), Some("Product saved."));
        assert_eq!(take_flash(&session).await, None);
    }

    #[tokio::test]
    async fn test_current_staff_round_trip() {
        let session = session();
        assert!(current_staff(&session).await.is_none());

        let staff = CurrentStaff {
            id: UserId::new(2),
            email: "ops@glowhaus.co".to_string(),
            name: "Ops".to_string(),
        };
        set_current_staff(&session, &staff).await.unwrap();
        assert_eq!(current_staff(&session).await, Some(staff));
    }

    #[test]
    fn test_rejection_redirects_to_login() {
        let response = StaffAuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login")
        );
    }
}
