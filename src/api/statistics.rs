//! Statistics page

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Datelike, Utc};

use crate::api::error::WebError;
use crate::api::forms::StatisticsQuery;
use crate::api::middleware::{is_htmx, AppState, AuthenticatedUser};
use crate::api::page_context;
use crate::models::Period;

/// Routes that require a session
pub fn router() -> Router<AppState> {
    Router::new().route("/statistics", get(statistics))
}

/// GET /statistics?year=&month=&period=year
async fn statistics(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    Query(query): Query<StatisticsQuery>,
) -> Result<Response, WebError> {
    let now = Utc::now();
    let period = resolve_period(&query, now);
    let report = state.statistics_service.report(period, now).await?;

    let mut ctx = page_context("Statistics", "statistics", Some(&user));
    ctx.insert("groups", &report.groups);
    ctx.insert("report", &report);

    let html = state
        .views
        .render_page("statistics.html", &ctx, is_htmx(&headers))?;
    Ok(Html(html).into_response())
}

/// Requested period; missing or invalid parts fall back to the current one.
fn resolve_period(query: &StatisticsQuery, now: DateTime<Utc>) -> Period {
    let year = query
        .year()
        .filter(|y| Period::year(*y).is_some())
        .unwrap_or_else(|| now.year());

    let period = if query.whole_year() {
        Period::year(year)
    } else {
        Period::month(year, query.month().unwrap_or_else(|| now.month()))
    };

    period.unwrap_or_else(|| Period::month_of(now))
}
