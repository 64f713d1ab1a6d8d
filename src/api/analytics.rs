//! Analytics API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::handlers::{error, internal, ApiError, AppState, DataResponse};
use crate::models::{BrowserClicks, ClickEvent, CountryClicks, DailyClicks, ReferrerClicks};

#[derive(Debug, Deserialize)]
pub struct ClicksQueryParams {
    /// Limit results (default: 100, max: 1000)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

type AnalyticsResult<T> = Result<Json<DataResponse<Vec<T>>>, ApiError>;

async fn ensure_link(state: &AppState, code: &str) -> Result<(), ApiError> {
    match state.storage.get(code).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(error(StatusCode::NOT_FOUND, "URL not found")),
        Err(err) => Err(internal("Failed to get URL", err)),
    }
}

fn respond<T>(rows: anyhow::Result<Vec<T>>, context: &str) -> AnalyticsResult<T> {
    rows.map(|data| Json(DataResponse { data }))
        .map_err(|err| internal(context, err))
}

pub async fn daily(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AnalyticsResult<DailyClicks> {
    ensure_link(&state, &code).await?;
    respond(
        state.storage.clicks_per_day(&code).await,
        "Failed to retrieve daily clicks",
    )
}

pub async fn browsers(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AnalyticsResult<BrowserClicks> {
    ensure_link(&state, &code).await?;
    respond(
        state.storage.clicks_per_browser(&code).await,
        "Failed to retrieve browser breakdown",
    )
}

pub async fn referrers(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AnalyticsResult<ReferrerClicks> {
    ensure_link(&state, &code).await?;
    respond(
        state.storage.clicks_per_referrer(&code).await,
        "Failed to retrieve referrer breakdown",
    )
}

pub async fn countries(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AnalyticsResult<CountryClicks> {
    ensure_link(&state, &code).await?;
    respond(
        state.storage.clicks_per_country(&code).await,
        "Failed to retrieve country breakdown",
    )
}

/// Raw click events for a short code, most recent first
pub async fn clicks(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(params): Query<ClicksQueryParams>,
) -> AnalyticsResult<ClickEvent> {
    let limit = params.limit.clamp(1, 1000);
    ensure_link(&state, &code).await?;
    respond(
        state.storage.list_clicks(&code, limit).await,
        "Failed to retrieve clicks",
    )
}
