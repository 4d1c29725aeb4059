//! Application state shared with the HTTP handlers.

use sqlx::PgPool;
use std::sync::Arc;

use crate::catalog::CatalogSource;
use crate::grid::GridService;
use crate::web::middleware::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub grids: GridService,
    pub catalog: Arc<dyn CatalogSource>,
    pub search_limiter: RateLimiter,
    /// Present when a durable store is configured; used for health probes.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        grids: GridService,
        catalog: Arc<dyn CatalogSource>,
        search_limiter: RateLimiter,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            grids,
            catalog,
            search_limiter,
            db_pool,
        }
    }
}
