//! Two-tier cache for the daily grid.
//!
//! The memory tier is a single slot holding the most recently resolved grid;
//! it is replaced, never appended to, when a new date's grid arrives. The
//! optional durable tier mirrors every computed grid keyed by date so a
//! restarted process serves the same selection. Durable writes are detached
//! tasks: their outcome is logged and never awaited by the request path, so
//! durability is best effort. A write that loses the insert race to another
//! instance swaps the stored row into the slot.

use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::data::GridStore;
use crate::grid::models::DailyGrid;

#[derive(Clone)]
pub struct GridCache {
    slot: Arc<RwLock<Option<Arc<DailyGrid>>>>,
    store: Option<Arc<dyn GridStore>>,
}

impl GridCache {
    pub fn new(store: Option<Arc<dyn GridStore>>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
            store,
        }
    }

    /// Backend name of the durable tier, or `"memory"` without one.
    pub fn store_kind(&self) -> &'static str {
        self.store.as_ref().map_or("memory", |s| s.kind())
    }

    /// Memory tier only: the slot's grid if it belongs to `date`.
    pub async fn cached(&self, date: NaiveDate) -> Option<Arc<DailyGrid>> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|grid| grid.date == date)
            .cloned()
    }

    /// Date of the grid currently held in memory.
    pub async fn cached_date(&self) -> Option<NaiveDate> {
        self.slot.read().await.as_ref().map(|grid| grid.date)
    }

    /// Memory tier, then the durable tier. A durable hit is promoted into
    /// the memory slot. Store failures are logged and reported as a miss.
    pub async fn get(&self, date: NaiveDate) -> Option<Arc<DailyGrid>> {
        if let Some(grid) = self.cached(date).await {
            return Some(grid);
        }

        let store = self.store.as_ref()?;
        match store.load(date).await {
            Ok(Some(games)) => {
                let grid = Arc::new(DailyGrid::new(date, games));
                *self.slot.write().await = Some(grid.clone());
                info!(%date, games = grid.games.len(), "Grid restored from durable store");
                Some(grid)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(%date, error = ?e, "Failed to read grid from durable store");
                None
            }
        }
    }

    /// Replace the memory slot with `grid` and start a detached durable write.
    ///
    /// When another writer already stored a grid for the date, the stored
    /// row replaces ours in the slot so every instance serves the first write.
    /// The returned handle may be dropped; it exists so callers that need to
    /// observe the write (tests, shutdown paths) can await it.
    pub async fn put(&self, grid: Arc<DailyGrid>) -> Option<JoinHandle<()>> {
        *self.slot.write().await = Some(grid.clone());

        let store = self.store.clone()?;
        let slot = self.slot.clone();
        Some(tokio::spawn(async move {
            match store.insert_if_absent(grid.date, &grid.games).await {
                Ok(true) => debug!(date = %grid.date, "Grid persisted"),
                Ok(false) => adopt_stored(&slot, store.as_ref(), &grid).await,
                Err(e) => warn!(date = %grid.date, error = ?e, "Failed to persist grid"),
            }
        }))
    }
}

/// Swap the slot over to the row a concurrent writer stored for `ours.date`,
/// unless the slot has since moved on to another grid.
async fn adopt_stored(
    slot: &RwLock<Option<Arc<DailyGrid>>>,
    store: &dyn GridStore,
    ours: &Arc<DailyGrid>,
) {
    let date = ours.date;
    let games = match store.load(date).await {
        Ok(Some(games)) => games,
        Ok(None) => return,
        Err(e) => {
            warn!(%date, error = ?e, "Failed to reload grid after losing insert race");
            return;
        }
    };
    if games == ours.games {
        debug!(%date, "Grid already persisted with the same selection");
        return;
    }

    let mut current = slot.write().await;
    if current.as_ref().is_some_and(|g| Arc::ptr_eq(g, ours)) {
        *current = Some(Arc::new(DailyGrid::new(date, games)));
        info!(%date, "Adopted grid stored by another writer");
    }
}
