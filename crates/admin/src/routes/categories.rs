//! Category management.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use glowhaus_api::{ApiError, FieldErrors};
use glowhaus_core::CategoryId;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::forms::CategoryForm;
use crate::middleware::{RequireStaff, SessionTokenStore, set_flash};
use crate::state::AppState;
use crate::views::{AdminPage, CategoryOption, CategoryRow, render};

/// Category listing template.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub page: AdminPage,
    pub categories: Vec<CategoryRow>,
}

/// Category create/edit template.
#[derive(Template)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub page: AdminPage,
    /// Id of the category being edited; `None` when creating.
    pub id: Option<i64>,
    pub form: CategoryForm,
    pub parents: Vec<CategoryOption>,
    pub errors: FieldErrors,
}

/// Category listing page handler.
#[instrument(skip_all)]
pub async fn index(page: AdminPage, State(state): State<AppState>) -> Result<Html<String>> {
    let categories = state.api().categories().await?;
    Ok(render(&CategoriesIndexTemplate {
        page,
        categories: CategoryRow::list(&categories),
    }))
}

async fn form_page(
    state: &AppState,
    page: AdminPage,
    id: Option<CategoryId>,
    form: CategoryForm,
    errors: FieldErrors,
) -> Result<Response> {
    let categories = state.api().categories().await?;
    let id = id.map(|id| id.as_i64());
    Ok(render(&CategoryFormTemplate {
        parents: CategoryOption::list(&categories, id, &form.parent),
        page,
        id,
        form,
        errors,
    })
    .into_response())
}

/// New category form.
#[instrument(skip_all)]
pub async fn new(page: AdminPage, State(state): State<AppState>) -> Result<Response> {
    form_page(&state, page, None, CategoryForm::blank(), FieldErrors::new()).await
}

/// Create a category.
#[instrument(skip_all)]
pub async fn create(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let write = match form.validate(None) {
        Ok(write) => write,
        Err(errors) => return form_page(&state, page, None, form, errors).await,
    };

    match state.api().create_category(&store, &write).await {
        Ok(category) => {
            tracing::info!(id = %category.id, "Category created");
            set_flash(store.session(), format!("Created {}.", category.name)).await;
            Ok(Redirect::to("/categories").into_response())
        }
        Err(ApiError::Validation(errors)) => form_page(&state, page, None, form, errors).await,
        Err(e) => Err(e.into()),
    }
}

/// Edit category form.
#[instrument(skip_all, fields(id = %id))]
pub async fn edit(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let category = state.api().admin_category(&store, id).await?;
    let form = CategoryForm::from(&category);
    form_page(&state, page, Some(id), form, FieldErrors::new()).await
}

/// Save changes to a category.
#[instrument(skip_all, fields(id = %id))]
pub async fn update(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let write = match form.validate(Some(id)) {
        Ok(write) => write,
        Err(errors) => return form_page(&state, page, Some(id), form, errors).await,
    };

    match state.api().update_category(&store, id, &write).await {
        Ok(category) => {
            tracing::info!("Category updated");
            set_flash(store.session(), format!("Saved {}.", category.name)).await;
            Ok(Redirect::to("/categories").into_response())
        }
        Err(ApiError::Validation(errors)) => {
            form_page(&state, page, Some(id), form, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a category.
#[instrument(skip_all, fields(id = %id))]
pub async fn delete(
    _staff: RequireStaff,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Redirect> {
    state.api().delete_category(&store, id).await?;
    tracing::info!("Category deleted");
    set_flash(store.session(), "Category deleted.").await;
    Ok(Redirect::to("/categories"))
}
