//! Journal (editorial blog) management. Drafts are listed alongside
//! published entries.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use glowhaus_api::{ApiError, FieldErrors};
use serde::Deserialize;
use tracing::instrument;

use super::API_PAGE_SIZE;
use crate::error::Result;
use crate::filters;
use crate::forms::JournalForm;
use crate::middleware::{RequireStaff, SessionTokenStore, set_flash};
use crate::state::AppState;
use crate::views::{AdminPage, JournalRow, Pagination, render};

#[derive(Debug, Default, Deserialize)]
pub struct JournalListQuery {
    pub page: Option<u32>,
}

/// Journal listing template.
#[derive(Template)]
#[template(path = "journal/index.html")]
pub struct JournalIndexTemplate {
    pub page: AdminPage,
    pub entries: Vec<JournalRow>,
    pub pagination: Pagination,
}

/// Journal entry create/edit template.
#[derive(Template)]
#[template(path = "journal/form.html")]
pub struct JournalFormTemplate {
    pub page: AdminPage,
    pub slug: Option<String>,
    pub form: JournalForm,
    pub errors: FieldErrors,
}

fn form_page(page: AdminPage, slug: Option<String>, form: JournalForm, errors: FieldErrors) -> Response {
    render(&JournalFormTemplate {
        page,
        slug,
        form,
        errors,
    })
    .into_response()
}

/// Journal listing page handler.
#[instrument(skip_all)]
pub async fn index(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Query(query): Query<JournalListQuery>,
) -> Result<Html<String>> {
    let page_number = query.page.unwrap_or(1).max(1);
    let results = state.api().admin_journal(&store, Some(page_number)).await?;
    Ok(render(&JournalIndexTemplate {
        page,
        entries: results.iter().map(JournalRow::from).collect(),
        pagination: Pagination::new(&results, page_number, API_PAGE_SIZE, "/journal"),
    }))
}

/// New entry form.
#[instrument(skip_all)]
pub async fn new(page: AdminPage) -> Response {
    form_page(page, None, JournalForm::default(), FieldErrors::new())
}

/// Create an entry.
#[instrument(skip_all)]
pub async fn create(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Form(form): Form<JournalForm>,
) -> Result<Response> {
    let write = match form.validate() {
        Ok(write) => write,
        Err(errors) => return Ok(form_page(page, None, form, errors)),
    };

    match state.api().create_journal_entry(&store, &write).await {
        Ok(entry) => {
            tracing::info!(slug = %entry.slug, published = entry.is_published, "Journal entry created");
            set_flash(store.session(), format!("Created \"{}\".", entry.title)).await;
            Ok(Redirect::to("/journal").into_response())
        }
        Err(ApiError::Validation(errors)) => Ok(form_page(page, None, form, errors)),
        Err(e) => Err(e.into()),
    }
}

/// Edit entry form.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn edit(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let entry = state.api().admin_journal_entry(&store, &slug).await?;
    Ok(form_page(page, Some(entry.slug.clone()), JournalForm::from(&entry), FieldErrors::new()))
}

/// Save changes to an entry.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn update(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<JournalForm>,
) -> Result<Response> {
    let write = match form.validate() {
        Ok(write) => write,
        Err(errors) => return Ok(form_page(page, Some(slug), form, errors)),
    };

    match state.api().update_journal_entry(&store, &slug, &write).await {
        Ok(entry) => {
            tracing::info!(published = entry.is_published, "Journal entry updated");
            set_flash(store.session(), format!("Saved \"{}\".", entry.title)).await;
            Ok(Redirect::to("/journal").into_response())
        }
        Err(ApiError::Validation(errors)) => Ok(form_page(page, Some(slug), form, errors)),
        Err(e) => Err(e.into()),
    }
}

/// Delete an entry.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn delete(
    _staff: RequireStaff,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Redirect> {
    state.api().delete_journal_entry(&store, &slug).await?;
    tracing::info!("Journal entry deleted");
    set_flash(store.session(), "Journal entry deleted.").await;
    Ok(Redirect::to("/journal"))
}
