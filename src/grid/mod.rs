//! Daily grid resolution: cache lookup, candidate fetch and selection.

pub mod cache;
pub mod models;
pub mod selector;

use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::catalog::{CatalogError, CatalogSource};
use cache::GridCache;
use models::DailyGrid;

/// Number of games on a grid.
pub const GRID_SIZE: usize = 9;

/// Resolves the grid for a date from memory, the durable store, or a fresh
/// selection over the catalog pool, in that order.
#[derive(Clone)]
pub struct GridService {
    cache: GridCache,
    catalog: Arc<dyn CatalogSource>,
    /// Held while a missing grid is being built so concurrent requests in
    /// this process wait for it instead of fetching the pool again.
    fill: Arc<Mutex<()>>,
}

impl GridService {
    pub fn new(cache: GridCache, catalog: Arc<dyn CatalogSource>) -> Self {
        Self {
            cache,
            catalog,
            fill: Arc::new(Mutex::new(())),
        }
    }

    pub fn cache(&self) -> &GridCache {
        &self.cache
    }

    /// The complete grid for `date`, or an error. Never a partial grid.
    pub async fn grid_for(&self, date: NaiveDate) -> Result<Arc<DailyGrid>, CatalogError> {
        if let Some(grid) = self.cache.cached(date).await {
            return Ok(grid);
        }

        let _guard = self.fill.lock().await;
        if let Some(grid) = self.cache.get(date).await {
            debug!(%date, "Grid resolved after waiting on fill");
            return Ok(grid);
        }

        let pool = self.catalog.fetch_pool(date).await?;
        if pool.is_empty() {
            return Err(CatalogError::EmptyPool);
        }

        let games = selector::select(&pool, date, GRID_SIZE);
        let grid = Arc::new(DailyGrid::new(date, games));
        info!(
            %date,
            pool = pool.len(),
            selected = grid.games.len(),
            "Built daily grid"
        );

        // The durable write runs detached; its outcome is only logged.
        let _ = self.cache.put(grid.clone()).await;
        Ok(grid)
    }
}
