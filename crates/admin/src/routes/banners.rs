//! Home page banner management.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use glowhaus_api::{ApiError, FieldErrors};
use glowhaus_core::BannerId;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::forms::BannerForm;
use crate::middleware::{RequireStaff, SessionTokenStore, set_flash};
use crate::state::AppState;
use crate::views::{AdminPage, BannerRow, render};

/// Banner listing template.
#[derive(Template)]
#[template(path = "banners/index.html")]
pub struct BannersIndexTemplate {
    pub page: AdminPage,
    pub banners: Vec<BannerRow>,
}

/// Banner create/edit template.
#[derive(Template)]
#[template(path = "banners/form.html")]
pub struct BannerFormTemplate {
    pub page: AdminPage,
    pub id: Option<i64>,
    pub form: BannerForm,
    pub errors: FieldErrors,
}

fn form_page(page: AdminPage, id: Option<BannerId>, form: BannerForm, errors: FieldErrors) -> Response {
    render(&BannerFormTemplate {
        page,
        id: id.map(|id| id.as_i64()),
        form,
        errors,
    })
    .into_response()
}

/// Banner listing, in display order.
#[instrument(skip_all)]
pub async fn index(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let banners = state.api().admin_banners(&store).await?;
    Ok(render(&BannersIndexTemplate {
        page,
        banners: banners.iter().map(BannerRow::from).collect(),
    }))
}

/// New banner form.
#[instrument(skip_all)]
pub async fn new(page: AdminPage) -> Response {
    form_page(page, None, BannerForm::blank(), FieldErrors::new())
}

/// Create a banner.
#[instrument(skip_all)]
pub async fn create(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Form(form): Form<BannerForm>,
) -> Result<Response> {
    let write = match form.validate() {
        Ok(write) => write,
        Err(errors) => return Ok(form_page(page, None, form, errors)),
    };

    match state.api().create_banner(&store, &write).await {
        Ok(banner) => {
            tracing::info!(id = %banner.id, "Banner created");
            set_flash(store.session(), "Banner created.").await;
            Ok(Redirect::to("/banners").into_response())
        }
        Err(ApiError::Validation(errors)) => Ok(form_page(page, None, form, errors)),
        Err(e) => Err(e.into()),
    }
}

/// Edit banner form.
#[instrument(skip_all, fields(id = %id))]
pub async fn edit(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
) -> Result<Response> {
    let banner = state.api().banner(&store, id).await?;
    Ok(form_page(page, Some(id), BannerForm::from(&banner), FieldErrors::new()))
}

/// Save changes to a banner.
#[instrument(skip_all, fields(id = %id))]
pub async fn update(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
    Form(form): Form<BannerForm>,
) -> Result<Response> {
    let write = match form.validate() {
        Ok(write) => write,
        Err(errors) => return Ok(form_page(page, Some(id), form, errors)),
    };

    match state.api().update_banner(&store, id, &write).await {
        Ok(_) => {
            tracing::info!("Banner updated");
            set_flash(store.session(), "Banner saved.").await;
            Ok(Redirect::to("/banners").into_response())
        }
        Err(ApiError::Validation(errors)) => Ok(form_page(page, Some(id), form, errors)),
        Err(e) => Err(e.into()),
    }
}

/// Delete a banner.
#[instrument(skip_all, fields(id = %id))]
pub async fn delete(
    _staff: RequireStaff,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
) -> Result<Redirect> {
    state.api().delete_banner(&store, id).await?;
    tracing::info!("Banner deleted");
    set_flash(store.session(), "Banner deleted.").await;
    Ok(Redirect::to("/banners"))
}
