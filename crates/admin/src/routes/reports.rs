//! Sales reports.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use glowhaus_core::models::ReportPeriod;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::SessionTokenStore;
use crate::state::AppState;
use crate::views::{AdminPage, ReportView, render};

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub period: Option<String>,
}

impl ReportQuery {
    /// The requested period; missing means the default (30 days).
    fn period(&self) -> Result<ReportPeriod> {
        match self.period.as_deref().map(str::trim) {
            None | Some("") => Ok(ReportPeriod::default()),
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Unknown report period: {raw}"))),
        }
    }
}

/// Period tab.
#[derive(Debug, Clone)]
pub struct PeriodTab {
    pub value: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Report page template.
#[derive(Template)]
#[template(path = "reports.html")]
pub struct ReportsTemplate {
    pub page: AdminPage,
    pub periods: Vec<PeriodTab>,
    pub period_label: &'static str,
    pub report: ReportView,
}

/// Report page handler.
#[instrument(skip_all)]
pub async fn index(
    page: AdminPage,
    store: SessionTokenStore,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Html<String>> {
    let period = query.period()?;
    let summary = state.api().report_summary(&store, period).await?;

    Ok(render(&ReportsTemplate {
        periods: ReportPeriod::ALL
            .iter()
            .map(|p| PeriodTab {
                value: p.as_str(),
                label: p.label(),
                active: *p == period,
            })
            .collect(),
        period_label: period.label(),
        report: ReportView::new(&summary, page.currency),
        page,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(period: Option<&str>) -> ReportQuery {
        ReportQuery {
            period: period.map(str::to_string),
        }
    }

    #[test]
    fn test_period_defaults_to_thirty_days() {
        assert_eq!(query(None).period().unwrap(), ReportPeriod::Month);
        assert_eq!(query(Some("")).period().unwrap(), ReportPeriod::Month);
    }

    #[test]
    fn test_period_parses_known_values() {
        assert_eq!(query(Some("7d")).period().unwrap(), ReportPeriod::Week);
        assert_eq!(query(Some("365d")).period().unwrap(), ReportPeriod::Year);
    }

    #[test]
    fn test_unknown_period_is_bad_request() {
        let err = query(Some("fortnight")).period().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
