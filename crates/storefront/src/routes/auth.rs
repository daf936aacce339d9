//! Authentication route handlers.
//!
//! Sign-in and registration go through the commerce API, which returns a
//! JWT pair. The pair and a copy of the visitor's identity are stored in
//! the session; the session id is cycled on every sign-in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use glowhaus_api::{ApiError, AuthSession, FieldErrors, Registration, TokenStore};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{LoginForm, RegisterForm};
use crate::middleware::{SessionTokenStore, safe_next, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::views::PageContext;

/// Where to go after signing in when no `next` was given.
const DEFAULT_NEXT: &str = "/account";

/// Query parameters carrying the post-login destination.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub form: LoginForm,
    pub next: String,
    pub errors: FieldErrors,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub form: RegisterForm,
    pub next: String,
    pub errors: FieldErrors,
}

fn next_or_default(next: Option<&str>) -> String {
    safe_next(next).unwrap_or(DEFAULT_NEXT).to_string()
}

/// Store a fresh sign-in in a new session id.
async fn start_session(store: &SessionTokenStore, auth: &AuthSession) -> Result<CurrentUser> {
    let session = store.session();
    session.cycle_id().await?;
    store.save(&auth.tokens).await;

    let user = CurrentUser::from_auth(auth);
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id, Some(&user.email));
    Ok(user)
}

/// Display login page.
#[instrument(skip_all)]
pub async fn login_page(page: PageContext, Query(query): Query<NextQuery>) -> Response {
    if page.user.is_some() {
        return Redirect::to(&next_or_default(query.next.as_deref())).into_response();
    }
    LoginTemplate {
        page,
        form: LoginForm::default(),
        next: next_or_default(query.next.as_deref()),
        errors: FieldErrors::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    store: SessionTokenStore,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = next_or_default(form.next.as_deref());

    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => return Ok(render_login(page, form, next, errors)),
    };

    let password = SecretString::from(form.password.clone());
    let auth = match state.api().login(&email, &password).await {
        Ok(auth) => auth,
        Err(e) if e.is_rejection() => {
            tracing::info!(error = %e, "Login rejected");
            let mut errors = e.field_errors().cloned().unwrap_or_default();
            if errors.is_empty() {
                errors.push_general("That email and password don't match our records.");
            }
            let form = LoginForm {
                password: String::new(),
                ..form
            };
            return Ok(render_login(page, form, next, errors));
        }
        Err(e) => return Err(e.into()),
    };

    let user = start_session(&store, &auth).await?;
    tracing::info!(user_id = %user.id, "Signed in");

    Ok(Redirect::to(&next).into_response())
}

fn render_login(page: PageContext, form: LoginForm, next: String, errors: FieldErrors) -> Response {
    LoginTemplate {
        page,
        form,
        next,
        errors,
    }
    .into_response()
}

/// Display registration page.
#[instrument(skip_all)]
pub async fn register_page(page: PageContext, Query(query): Query<NextQuery>) -> Response {
    if page.user.is_some() {
        return Redirect::to(DEFAULT_NEXT).into_response();
    }
    RegisterTemplate {
        page,
        form: RegisterForm::default(),
        next: next_or_default(query.next.as_deref()),
        errors: FieldErrors::new(),
    }
    .into_response()
}

/// Handle registration form submission.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    store: SessionTokenStore,
    page: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let next = next_or_default(form.next.as_deref());

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(render_register(page, form, next, errors)),
    };

    let registration = Registration {
        email: valid.email,
        first_name: valid.first_name,
        last_name: valid.last_name,
        phone: valid.phone,
        password: SecretString::from(form.password.clone()),
    };
    let auth = match state.api().register(&registration).await {
        Ok(auth) => auth,
        Err(ApiError::Validation(mut errors)) => {
            errors.rename("phone_number", "phone");
            errors.rename("password2", "password_confirm");
            return Ok(render_register(page, form, next, errors));
        }
        Err(e) => return Err(e.into()),
    };

    let user = start_session(&store, &auth).await?;
    tracing::info!(user_id = %user.id, "Registered");

    Ok(Redirect::to(&next).into_response())
}

fn render_register(page: PageContext, form: RegisterForm, next: String, errors: FieldErrors) -> Response {
    let form = RegisterForm {
        password: String::new(),
        password_confirm: String::new(),
        ..form
    };
    RegisterTemplate {
        page,
        form,
        next,
        errors,
    }
    .into_response()
}

/// Handle logout.
///
/// Blacklists the refresh token (best-effort) and flushes the session,
/// which also drops the cart.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, store: SessionTokenStore) -> Result<Response> {
    state.api().logout(&store).await;
    store.session().flush().await?;
    clear_sentry_user();

    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_or_default() {
        assert_eq!(next_or_default(None), "/account");
        assert_eq!(next_or_default(Some("/checkout")), "/checkout");
        assert_eq!(next_or_default(Some("https://evil.example")), "/account");
        assert_eq!(next_or_default(Some("//evil.example")), "/account");
    }
}
