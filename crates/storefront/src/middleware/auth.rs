//! Authentication extractors and the sign-in redirect.
//!
//! The commerce API decides whether a visitor is signed in; the session
//! only caches who they are. When a handler finds the session expired it
//! returns a response tagged with [`LoginRequired`], and
//! [`login_redirect_middleware`] turns that into a redirect to
//! `/auth/login?next=<where they were>`.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Marker placed in response extensions when the visitor must sign in.
#[derive(Debug, Clone, Copy)]
pub struct LoginRequired;

/// Response that asks [`login_redirect_middleware`] to send the visitor
/// to the sign-in page.
#[must_use]
pub fn login_required() -> Response {
    let mut response = Redirect::to("/auth/login").into_response();
    response.extensions_mut().insert(LoginRequired);
    response
}

/// Sign-in URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    match safe_next(Some(next)) {
        Some(next) if next != "/" => format!("/auth/login?next={}", urlencoding::encode(next)),
        _ => "/auth/login".to_string(),
    }
}

/// Accept only local absolute paths as post-login destinations.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    let next = next?.trim();
    let local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.starts_with("/\\")
        && !next.chars().any(char::is_control);
    local.then_some(next)
}

/// Rewrite [`LoginRequired`] responses into a sign-in redirect that
/// remembers the current page.
///
/// HTMX requests get `HX-Redirect` with the page the fragment was loaded
/// into, so the whole page navigates instead of swapping a login form
/// into a fragment.
pub async fn login_redirect_middleware(request: Request, next: Next) -> Response {
    let htmx_page = request
        .headers()
        .get("hx-current-url")
        .and_then(|v| v.to_str().ok())
        .and_then(|url| url::Url::parse(url).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        });
    let is_htmx = request.headers().contains_key("hx-request");
    let path = request
        .uri()
        .path_and_query()
        .map_or_else(|| "/".to_string(), ToString::to_string);

    let response = next.run(request).await;
    if response.extensions().get::<LoginRequired>().is_none() {
        return response;
    }

    if is_htmx {
        let location = login_url(htmx_page.as_deref().unwrap_or("/"));
        let mut response = StatusCode::OK.into_response();
        if let Ok(value) = HeaderValue::from_str(&location) {
            response.headers_mut().insert("HX-Redirect", value);
        }
        response
    } else {
        Redirect::to(&login_url(&path)).into_response()
    }
}

/// Extractor that requires a signed-in visitor.
///
/// If nobody is signed in, redirects to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.greeting_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        };

        let user = current_user(session).await.ok_or_else(login_required)?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the signed-in visitor.
///
/// Unlike `RequireAuth`, this does not reject the request if the visitor is not signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Helper to set the signed-in visitor in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}
