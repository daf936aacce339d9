//! Staff sign-in and sign-out.
//!
//! Staff use their commerce API account. The API decides who is staff: a
//! sign-in is accepted only when the token's `is_staff` claim or the
//! returned profile says so. Shopper accounts get their fresh tokens
//! revoked straight away and see the login form again.

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use glowhaus_api::{FieldErrors, MemoryTokenStore, TokenStore};
use secrecy::SecretString;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::LoginForm;
use crate::middleware::{OptionalStaff, SessionTokenStore, set_current_staff};
use crate::models::CurrentStaff;
use crate::state::AppState;
use crate::views::render;

const BAD_CREDENTIALS: &str = "That email and password don't match a staff account.";
const NOT_STAFF: &str = "This account does not have back-office access.";

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub form: LoginForm,
    pub errors: FieldErrors,
}

fn login_form(form: LoginForm, errors: FieldErrors) -> Response {
    let form = LoginForm {
        password: String::new(),
        ..form
    };
    render(&LoginTemplate { form, errors }).into_response()
}

fn login_error(form: LoginForm, message: &str) -> Response {
    let mut errors = FieldErrors::new();
    errors.push_general(message);
    login_form(form, errors)
}

/// Render the login page.
///
/// GET /auth/login
#[instrument(skip_all)]
pub async fn login_page(OptionalStaff(staff): OptionalStaff) -> Response {
    if staff.is_some() {
        return Redirect::to("/").into_response();
    }
    login_form(LoginForm::default(), FieldErrors::new())
}

/// Handle the login form.
///
/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    store: SessionTokenStore,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => return Ok(login_form(form, errors)),
    };

    let password = SecretString::from(form.password.clone());
    let auth = match state.api().login(&email, &password).await {
        Ok(auth) => auth,
        Err(e) if e.is_rejection() => {
            tracing::info!(error = %e, "Staff login rejected");
            return Ok(login_error(form, BAD_CREDENTIALS));
        }
        Err(e) => return Err(e.into()),
    };

    let Some(staff) = CurrentStaff::from_auth(&auth) else {
        tracing::warn!(user_id = %auth.claims.user_id, "Non-staff account tried to sign in");
        state
            .api()
            .logout(&MemoryTokenStore::with_tokens(auth.tokens))
            .await;
        return Ok(login_error(form, NOT_STAFF));
    };

    let session = store.session();
    session.cycle_id().await?;
    store.save(&auth.tokens).await;
    set_current_staff(session, &staff).await?;
    set_sentry_user(&staff.id, Some(&staff.email));

    tracing::info!(user_id = %staff.id, "Staff signed in");
    Ok(Redirect::to("/").into_response())
}

/// Sign out: revoke the refresh token and drop the session.
///
/// POST /auth/logout
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, store: SessionTokenStore) -> Result<Redirect> {
    state.api().logout(&store).await;
    store.session().flush().await?;
    clear_sentry_user();

    Ok(Redirect::to("/auth/login"))
}
