//! Site settings.

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use glowhaus_api::{ApiError, FieldErrors};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::forms::SettingsForm;
use crate::middleware::{SessionTokenStore, set_flash};
use crate::state::AppState;
use crate::views::{AdminPage, render};

/// Settings page template.
#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub page: AdminPage,
    pub form: SettingsForm,
    pub errors: FieldErrors,
}

fn settings_page(page: AdminPage, form: SettingsForm, errors: FieldErrors) -> Response {
    render(&SettingsTemplate { page, form, errors }).into_response()
}

/// Settings page handler.
#[instrument(skip_all)]
pub async fn index(page: AdminPage, State(state): State<AppState>) -> Result<Response> {
    let settings = state.api().site_settings().await?;
    Ok(settings_page(page, SettingsForm::from(&settings), FieldErrors::new()))
}

/// Save site settings.
#[instrument(skip_all)]
pub async fn update(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    let settings = match form.validate() {
        Ok(settings) => settings,
        Err(errors) => return Ok(settings_page(page, form, errors)),
    };

    match state.api().update_site_settings(&store, &settings).await {
        Ok(_) => {
            tracing::info!("Site settings updated");
            set_flash(store.session(), "Settings saved.").await;
            Ok(Redirect::to("/settings").into_response())
        }
        Err(ApiError::Validation(errors)) => Ok(settings_page(page, form, errors)),
        Err(e) => Err(e.into()),
    }
}
