//! Web API router construction and shared response utilities.

use axum::{
    Router,
    http::{HeaderValue, Method, Uri, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::state::AppState;
use crate::web::error::ApiError;
use crate::web::middleware::rate_limit::RateLimitLayer;
use crate::web::middleware::request_id::RequestIdLayer;
use crate::web::{games, search, status};

/// Cache-Control presets for public endpoints.
pub mod cache {
    /// Today's grid. Short, so a new day's grid is picked up soon after midnight UTC.
    pub const GRID: &str = "public, max-age=60, stale-while-revalidate=60";
    /// Search hits.
    pub const SEARCH: &str = "public, max-age=300";
}

/// Wraps a JSON response with a `Cache-Control` header.
pub fn with_cache_control<T: serde::Serialize>(value: T, header: &'static str) -> Response {
    let mut response = Json(value).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(header));
    response
}

/// Creates the web server router
pub fn create_router(app_state: AppState) -> Router {
    let search_router = Router::new()
        .route("/search", get(search::search))
        .route_layer(RateLimitLayer::new(app_state.search_limiter.clone()));

    let api_router = Router::new()
        .route("/games", get(games::get_games))
        .route("/status", get(status::status))
        .merge(search_router);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(status::health))
        .nest("/api", api_router)
        .fallback(not_found)
        .with_state(app_state)
        .layer((
            // Outermost: per-request ID span + severity-proportional response logging.
            RequestIdLayer,
            cors,
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(tower_http::CompressionLevel::Fastest),
            TimeoutLayer::new(Duration::from_secs(30)),
        ))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
