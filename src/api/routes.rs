use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::analytics;
use super::handlers::{get_link, health_check, redirect, shorten, update_link, AppState};

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/shorten", post(shorten))
        .route("/links/{code}", get(get_link).put(update_link))
        .route("/links/{code}/analytics/daily", get(analytics::daily))
        .route("/links/{code}/analytics/browsers", get(analytics::browsers))
        .route("/links/{code}/analytics/referrers", get(analytics::referrers))
        .route("/links/{code}/analytics/countries", get(analytics::countries))
        .route("/links/{code}/clicks", get(analytics::clicks));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .route("/{code}", get(redirect))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
