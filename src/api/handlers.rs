use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::analytics::{extract_client_ip, ClickRecorder, Visit};
use crate::config::AnalyticsConfig;
use crate::models::{LinkData, ShortenRequest, ShortenResponse, UpdateLinkRequest};
use crate::shortener::{self, AllocationError};
use crate::storage::{Storage, StoreHealth};

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub recorder: Arc<ClickRecorder>,
    pub analytics: AnalyticsConfig,
    /// Prefix for returned short URLs, without a trailing slash
    pub public_base_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn internal(context: &str, err: impl std::fmt::Display) -> ApiError {
    tracing::error!(error = %err, "{context}");
    error(StatusCode::INTERNAL_SERVER_ERROR, context)
}

/// Shorten a URL
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, ApiError> {
    let Json(payload) =
        payload.map_err(|rejection| error(StatusCode::BAD_REQUEST, rejection.body_text()))?;

    let url = shortener::validate(&payload.url)
        .map_err(|reason| error(StatusCode::BAD_REQUEST, format!("Invalid URL: {reason}")))?;

    match shortener::allocate(state.storage.as_ref(), url.as_str()).await {
        Ok(link) => Ok(Json(ShortenResponse {
            data: format!("{}/{}", state.public_base_url, link.code),
        })),
        Err(err @ AllocationError::Exhausted { .. }) => {
            Err(internal("Failed to generate unique short code", err))
        }
        Err(err @ AllocationError::Storage(_)) => Err(internal("Failed to create short link", err)),
    }
}

/// Redirect to the destination and record the click
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let link = match state.storage.get(&code).await {
        Ok(Some(link)) => link,
        Ok(None) => return (StatusCode::NOT_FOUND, "URL not found").into_response(),
        Err(err) => {
            tracing::error!(short_code = %code, error = %err, "failed to resolve short code");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
        }
    };

    let client_ip = extract_client_ip(&headers, addr.ip(), &state.analytics);
    let visit = Visit::from_headers(&headers, client_ip, Utc::now());
    let click = state.recorder.build_click(&link.code, &visit);

    if let Err(err) = state.storage.record_click(&click).await {
        tracing::warn!(short_code = %code, error = %err, "failed to record click");
    }

    Redirect::temporary(&link.destination).into_response()
}

/// Resolution info for a short code
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<DataResponse<LinkData>>, ApiError> {
    match state.storage.get(&code).await {
        Ok(Some(link)) => Ok(Json(DataResponse { data: link.into() })),
        Ok(None) => Err(error(StatusCode::NOT_FOUND, "URL not found")),
        Err(err) => Err(internal("Failed to get URL", err)),
    }
}

/// Point an existing short code at a new destination
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    payload: Result<Json<UpdateLinkRequest>, JsonRejection>,
) -> Result<Json<DataResponse<LinkData>>, ApiError> {
    let Json(payload) =
        payload.map_err(|rejection| error(StatusCode::BAD_REQUEST, rejection.body_text()))?;

    let url = shortener::validate(&payload.url)
        .map_err(|reason| error(StatusCode::BAD_REQUEST, format!("Invalid URL: {reason}")))?;

    match state.storage.update_destination(&code, url.as_str()).await {
        Ok(true) => {}
        Ok(false) => return Err(error(StatusCode::NOT_FOUND, "URL not found")),
        Err(err) => return Err(internal("Failed to update URL", err)),
    }

    tracing::info!(short_code = %code, "destination updated");

    match state.storage.get(&code).await {
        Ok(Some(link)) => Ok(Json(DataResponse { data: link.into() })),
        Ok(None) => Err(error(StatusCode::NOT_FOUND, "URL not found")),
        Err(err) => Err(internal("Failed to get URL", err)),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<StoreHealth>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.storage.health().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "OK",
                database: Some(stats),
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    database: None,
                }),
            )
        }
    }
}
