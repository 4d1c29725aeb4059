//! Health and status handlers.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{trace, warn};

use crate::state::AppState;
use crate::utils::fmt_duration;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    status: &'static str,
    version: &'static str,
    commit: &'static str,
    store: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
    cached_date: Option<String>,
}

/// `GET /health`
pub(super) async fn health() -> Json<Value> {
    trace!("health check requested");
    Json(json!({ "status": "ok" }))
}

/// `GET /api/status`
pub(super) async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let database = match &state.db_pool {
        None => None,
        Some(pool) => match crate::data::health::ping(pool).await {
            Ok(latency) => {
                trace!(latency = fmt_duration(latency), "database ping");
                Some("ok")
            }
            Err(e) => {
                warn!(error = ?e, "Database ping failed");
                Some("error")
            }
        },
    };

    let cache = state.grids.cache();
    Json(StatusResponse {
        status: if database == Some("error") { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GIT_COMMIT_HASH"),
        store: cache.store_kind(),
        database,
        cached_date: cache.cached_date().await.map(|d| d.to_string()),
    })
}
