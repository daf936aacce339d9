//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use glowhaus_api::ProductQuery;
use glowhaus_core::models::{Category, Product};
use serde::Deserialize;
use tracing::instrument;

use super::is_htmx;
use crate::error::Result;
use crate::filters;
use crate::state::AppState;
use crate::views::{PageContext, Pagination, ProductCard, ProductDetail};

/// Products per listing page.
pub const PAGE_SIZE: u32 = 12;

/// Related products shown under a product.
const RELATED_COUNT: usize = 4;

/// Listing sort options offered to shoppers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [Self::Newest, Self::PriceAsc, Self::PriceDesc, Self::Name];

    /// Backend `ordering` parameter.
    #[must_use]
    pub const fn ordering(self) -> &'static str {
        match self {
            Self::Newest => "-created_at",
            Self::PriceAsc => "price",
            Self::PriceDesc => "-price",
            Self::Name => "name",
        }
    }

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Name => "name",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
        }
    }
}

/// Listing filters from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    pub page: Option<u32>,
}

impl ListingQuery {
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// API query for this listing, optionally pinned to a category.
    #[must_use]
    pub fn to_api(&self, category: Option<&str>) -> ProductQuery {
        ProductQuery {
            category: category.or_else(|| self.category()).map(str::to_string),
            search: self.search().map(str::to_string),
            ordering: Some(self.sort.ordering().to_string()),
            page: Some(self.page()),
            page_size: Some(PAGE_SIZE),
            featured: None,
        }
    }

    /// Link base carrying the current filters, without the page number.
    #[must_use]
    pub fn link_base(&self, path: &str) -> String {
        let mut params = Vec::new();
        if let Some(category) = self.category() {
            params.push(format!("category={}", urlencoding::encode(category)));
        }
        if let Some(q) = self.search() {
            params.push(format!("q={}", urlencoding::encode(q)));
        }
        if self.sort != SortOrder::default() {
            params.push(format!("sort={}", self.sort.as_str()));
        }
        if params.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", params.join("&"))
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<Category>,
    pub selected_category: String,
    pub search: String,
    pub sort: SortOrder,
    pub sorts: [SortOrder; 4],
    pub total: u64,
    pub pagination: Pagination,
}

/// Product grid fragment (for HTMX filter changes).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub products: Vec<ProductCard>,
    pub total: u64,
    pub pagination: Pagination,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetail,
    pub related: Vec<ProductCard>,
}

/// Quick view fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_view.html")]
pub struct QuickViewTemplate {
    pub product: ProductDetail,
}

/// Display product listing page.
///
/// HTMX requests (filter and sort changes) get just the grid.
#[instrument(skip(state, page, headers))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    headers: HeaderMap,
    Query(query): Query<ListingQuery>,
) -> Result<Response> {
    let results = state.api().products(&query.to_api(None)).await?;
    let pagination = Pagination::new(&results, query.page(), PAGE_SIZE, &query.link_base("/products"));
    let products = ProductCard::list(&results.results, page.currency);

    if is_htmx(&headers) {
        return Ok(ProductGridTemplate {
            products,
            total: results.count,
            pagination,
        }
        .into_response());
    }

    let categories = state.api().categories().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load categories for filters");
        Vec::new()
    });

    Ok(ProductsIndexTemplate {
        page,
        products,
        categories: categories.into_iter().filter(|c| c.is_active).collect(),
        selected_category: query.category().unwrap_or_default().to_string(),
        search: query.search().unwrap_or_default().to_string(),
        sort: query.sort,
        sorts: SortOrder::ALL,
        total: results.count,
        pagination,
    }
    .into_response())
}

/// Display product detail page.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = state.api().product(&slug).await?;

    let related = related_products(&state, &product)
        .await
        .iter()
        .map(|p| ProductCard::new(p, page.currency))
        .collect();

    Ok(ProductShowTemplate {
        product: ProductDetail::new(&product, page.currency),
        related,
        page,
    })
}

/// Products from the same category, excluding the one being viewed.
///
/// Best-effort: any API failure just hides the section.
async fn related_products(state: &AppState, product: &Product) -> Vec<Product> {
    let Some(category_id) = product.category else {
        return Vec::new();
    };
    let category = match state.api().categories().await {
        Ok(categories) => categories.into_iter().find(|c| c.id == category_id),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories for related products");
            None
        }
    };
    let Some(category) = category else {
        return Vec::new();
    };

    let query = ProductQuery {
        category: Some(category.slug),
        page_size: u32::try_from(RELATED_COUNT + 1).ok(),
        ..ProductQuery::default()
    };
    match state.api().products(&query).await {
        Ok(page) => page
            .results
            .into_iter()
            .filter(|p| p.slug != product.slug)
            .take(RELATED_COUNT)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load related products");
            Vec::new()
        }
    }
}

/// Quick view fragment for a product (HTMX).
#[instrument(skip(state))]
pub async fn quick_view(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = state.api().product(&slug).await?;
    let currency = state.config().store.currency;

    Ok(QuickViewTemplate {
        product: ProductDetail::new(&product, currency),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_maps_to_backend_ordering() {
        assert_eq!(SortOrder::Newest.ordering(), "-created_at");
        assert_eq!(SortOrder::PriceAsc.ordering(), "price");
        assert_eq!(SortOrder::PriceDesc.ordering(), "-price");
        assert_eq!(SortOrder::Name.ordering(), "name");
    }

    #[test]
    fn test_listing_query_to_api() {
        let query = ListingQuery {
            category: Some("serums".to_string()),
            q: Some("  vitamin c ".to_string()),
            sort: SortOrder::PriceDesc,
            page: Some(0),
        };
        let api = query.to_api(None);
        assert_eq!(api.category.as_deref(), Some("serums"));
        assert_eq!(api.search.as_deref(), Some("vitamin c"));
        assert_eq!(api.ordering.as_deref(), Some("-price"));
        assert_eq!(api.page, Some(1));
        assert_eq!(api.page_size, Some(PAGE_SIZE));

        let pinned = query.to_api(Some("toners"));
        assert_eq!(pinned.category.as_deref(), Some("toners"));
    }

    #[test]
    fn test_listing_link_base_keeps_filters() {
        let query = ListingQuery {
            category: Some("serums".to_string()),
            q: Some("glow & go".to_string()),
            sort: SortOrder::Name,
            page: Some(3),
        };
        assert_eq!(
            query.link_base("/products"),
            "/products?category=serums&q=glow%20%26%20go&sort=name"
        );
        assert_eq!(ListingQuery::default().link_base("/products"), "/products");
    }
}
