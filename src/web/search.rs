//! Title search for guess candidates.
//!
//! Requests reach this handler only after the route's rate limit layer has
//! admitted them.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use tracing::debug;

use crate::catalog::SearchQuery;
use crate::state::AppState;
use crate::web::error::{ApiError, catalog_error};
use crate::web::routes::{cache, with_cache_control};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
}

/// `GET /api/search?query={text}`
pub(super) async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let raw = params
        .query
        .ok_or_else(|| ApiError::bad_request("Missing 'query' parameter"))?;
    let query = SearchQuery::parse(&raw)?;

    let hits = state
        .catalog
        .search(&query)
        .await
        .map_err(|e| catalog_error("Game search", e))?;
    debug!(query = %query, hits = hits.len(), "Search completed");

    Ok(with_cache_control(hits, cache::SEARCH))
}
