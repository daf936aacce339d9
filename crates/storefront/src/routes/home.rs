//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use glowhaus_api::ProductQuery;
use glowhaus_core::models::{Banner, Category};
use tracing::instrument;

use crate::filters;
use crate::state::AppState;
use crate::views::{JournalCard, PageContext, ProductCard};

/// Featured products shown on the home page.
const FEATURED_COUNT: u32 = 8;

/// Journal teasers shown on the home page.
const JOURNAL_COUNT: u32 = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub banners: Vec<Banner>,
    pub featured: Vec<ProductCard>,
    pub categories: Vec<Category>,
    pub journal: Vec<JournalCard>,
}

/// Display the home page.
///
/// Each section is optional: if the API fails for one, the page renders
/// without it.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let api = state.api();
    let featured_query = ProductQuery::featured(FEATURED_COUNT);
    let (banners, featured, categories, journal) = tokio::join!(
        api.banners(),
        api.products(&featured_query),
        api.categories(),
        api.journal(Some(1), Some(JOURNAL_COUNT)),
    );

    let banners = banners.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load banners");
        Vec::new()
    });
    let featured = featured.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load featured products");
            Vec::new()
        },
        |products| ProductCard::list(&products.results, page.currency),
    );
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load categories");
        Vec::new()
    });
    let journal = journal.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load journal");
            Vec::new()
        },
        |entries| entries.iter().map(JournalCard::from).collect(),
    );

    HomeTemplate {
        page,
        banners: banners.into_iter().filter(|b| b.is_active).collect(),
        featured,
        categories: categories.into_iter().filter(|c| c.is_active && c.parent.is_none()).collect(),
        journal,
    }
}
