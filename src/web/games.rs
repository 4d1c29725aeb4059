//! Today's grid.

use axum::extract::State;
use axum::response::Response;
use serde::Serialize;
use ts_rs::TS;

use crate::grid::models::Game;
use crate::state::AppState;
use crate::utils::today_utc;
use crate::web::error::{ApiError, catalog_error};
use crate::web::routes::{cache, with_cache_control};

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GamesResponse {
    pub games: Vec<Game>,
    /// The grid's calendar date, `YYYY-MM-DD`.
    pub grid_id: String,
}

/// `GET /api/games`
pub(super) async fn get_games(State(state): State<AppState>) -> Result<Response, ApiError> {
    let grid = state
        .grids
        .grid_for(today_utc())
        .await
        .map_err(|e| catalog_error("Loading today's grid", e))?;

    Ok(with_cache_control(
        GamesResponse {
            games: grid.games.clone(),
            grid_id: grid.grid_id(),
        },
        cache::GRID,
    ))
}
