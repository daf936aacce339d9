//! Product catalog management.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use glowhaus_api::{ApiError, FieldErrors, ProductQuery};
use serde::Deserialize;
use tracing::instrument;

use super::PAGE_SIZE;
use crate::error::Result;
use crate::filters;
use crate::forms::ProductForm;
use crate::middleware::{RequireStaff, SessionTokenStore, set_flash};
use crate::state::AppState;
use crate::views::{AdminPage, CategoryOption, Pagination, ProductRow, listing_url, render};

/// Product listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// Product listing template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: AdminPage,
    pub products: Vec<ProductRow>,
    pub search: String,
    pub pagination: Pagination,
}

/// Product create/edit template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: AdminPage,
    /// Slug of the product being edited; `None` when creating.
    pub slug: Option<String>,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
    pub errors: FieldErrors,
}

/// Product listing page handler.
#[instrument(skip_all)]
pub async fn index(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Html<String>> {
    let page_number = query.page.unwrap_or(1).max(1);
    let search = query.q.unwrap_or_default();

    let api_query = ProductQuery {
        search: Some(search.clone()).filter(|s| !s.trim().is_empty()),
        ordering: Some("-created_at".to_string()),
        page: Some(page_number),
        page_size: Some(PAGE_SIZE),
        ..ProductQuery::default()
    };
    let results = state.api().admin_products(&store, &api_query).await?;

    let base = listing_url("/products", &[("q", Some(search.as_str()))]);
    Ok(render(&ProductsIndexTemplate {
        products: results.iter().map(|p| ProductRow::new(p, page.currency)).collect(),
        pagination: Pagination::new(&results, page_number, PAGE_SIZE, &base),
        search,
        page,
    }))
}

async fn form_page(
    state: &AppState,
    page: AdminPage,
    slug: Option<String>,
    form: ProductForm,
    errors: FieldErrors,
) -> Result<Response> {
    let categories = state.api().categories().await?;
    let categories = CategoryOption::list(&categories, None, &form.category);
    Ok(render(&ProductFormTemplate {
        page,
        slug,
        form,
        categories,
        errors,
    })
    .into_response())
}

/// New product form.
#[instrument(skip_all)]
pub async fn new(page: AdminPage, State(state): State<AppState>) -> Result<Response> {
    form_page(&state, page, None, ProductForm::blank(), FieldErrors::new()).await
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let write = match form.validate() {
        Ok(write) => write,
        Err(errors) => return form_page(&state, page, None, form, errors).await,
    };

    match state.api().create_product(&store, &write).await {
        Ok(product) => {
            tracing::info!(slug = %product.slug, "Product created");
            set_flash(store.session(), format!("Created {}.", product.name)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(ApiError::Validation(errors)) => form_page(&state, page, None, form, errors).await,
        Err(e) => Err(e.into()),
    }
}

/// Edit product form.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn edit(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let product = state.api().admin_product(&store, &slug).await?;
    let form = ProductForm::from(&product);
    form_page(&state, page, Some(product.slug), form, FieldErrors::new()).await
}

/// Save changes to a product.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn update(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let write = match form.validate() {
        Ok(write) => write,
        Err(errors) => return form_page(&state, page, Some(slug), form, errors).await,
    };

    match state.api().update_product(&store, &slug, &write).await {
        Ok(product) => {
            tracing::info!(slug = %product.slug, "Product updated");
            set_flash(store.session(), format!("Saved {}.", product.name)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(ApiError::Validation(errors)) => {
            form_page(&state, page, Some(slug), form, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a product.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn delete(
    _staff: RequireStaff,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Redirect> {
    state.api().delete_product(&store, &slug).await?;
    tracing::info!("Product deleted");
    set_flash(store.session(), "Product deleted.").await;
    Ok(Redirect::to("/products"))
}
