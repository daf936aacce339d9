//! Journal (blog) route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use glowhaus_core::models::JournalEntry;
use tracing::instrument;

use super::account::PageQuery;
use crate::error::Result;
use crate::filters;
use crate::state::AppState;
use crate::views::{JournalCard, PageContext, Pagination};

const PAGE_SIZE: u32 = 9;

/// Journal index template.
#[derive(Template, WebTemplate)]
#[template(path = "journal/index.html")]
pub struct JournalIndexTemplate {
    pub page: PageContext,
    pub entries: Vec<JournalCard>,
    pub pagination: Pagination,
}

/// Journal entry template.
#[derive(Template, WebTemplate)]
#[template(path = "journal/show.html")]
pub struct JournalShowTemplate {
    pub page: PageContext,
    pub entry: JournalEntry,
    pub published_on: String,
}

/// Display published journal entries.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page_number = query.page.unwrap_or(1).max(1);
    let results = state.api().journal(Some(page_number), Some(PAGE_SIZE)).await?;

    Ok(JournalIndexTemplate {
        page,
        entries: results.iter().map(JournalCard::from).collect(),
        pagination: Pagination::new(&results, page_number, PAGE_SIZE, "/journal"),
    })
}

/// Display a single journal entry.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let entry = state.api().journal_entry(&slug).await?;

    Ok(JournalShowTemplate {
        published_on: crate::views::date(entry.published_at),
        page,
        entry,
    })
}
