//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use glowhaus_core::models::Category;
use tracing::instrument;

use super::is_htmx;
use super::products::{ListingQuery, PAGE_SIZE, ProductGridTemplate, SortOrder};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;
use crate::views::{PageContext, Pagination, ProductCard};

/// Category listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub page: PageContext,
    pub categories: Vec<Category>,
}

/// Category detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub page: PageContext,
    pub category: Category,
    pub subcategories: Vec<Category>,
    pub products: Vec<ProductCard>,
    pub sort: SortOrder,
    pub sorts: [SortOrder; 4],
    pub total: u64,
    pub pagination: Pagination,
}

/// Display all active categories.
#[instrument(skip(state, page))]
pub async fn index(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    let categories = state.api().categories().await?;

    Ok(CategoriesIndexTemplate {
        page,
        categories: categories.into_iter().filter(|c| c.is_active).collect(),
    })
}

/// Display a category with its products.
#[instrument(skip(state, page, headers))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Response> {
    let category = state.api().category(&slug).await?;
    let results = state.api().products(&query.to_api(Some(&category.slug))).await?;

    let base = ListingQuery {
        category: None,
        ..query.clone()
    }
    .link_base(&format!("/categories/{}", category.slug));
    let pagination = Pagination::new(&results, query.page(), PAGE_SIZE, &base);
    let products = ProductCard::list(&results.results, page.currency);

    if is_htmx(&headers) {
        return Ok(ProductGridTemplate {
            products,
            total: results.count,
            pagination,
        }
        .into_response());
    }

    let subcategories = match state.api().categories().await {
        Ok(all) => all
            .into_iter()
            .filter(|c| c.is_active && c.parent == Some(category.id))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load subcategories");
            Vec::new()
        }
    };

    Ok(CategoryShowTemplate {
        page,
        category,
        subcategories,
        products,
        sort: query.sort,
        sorts: SortOrder::ALL,
        total: results.count,
        pagination,
    }
    .into_response())
}
