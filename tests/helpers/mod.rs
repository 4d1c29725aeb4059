//! Shared fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use gamegrid::catalog::{CatalogError, CatalogSource, SearchQuery};
use gamegrid::data::GridStore;
use gamegrid::grid::GridService;
use gamegrid::grid::cache::GridCache;
use gamegrid::grid::models::Game;
use gamegrid::state::AppState;
use gamegrid::web::middleware::rate_limit::RateLimiter;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn game(id: u64) -> Game {
    Game {
        id,
        name: format!("Game {id}"),
        cover: Some(format!("https://images.igdb.com/igdb/image/upload/t_cover_big/c{id}.jpg")),
        screenshots: Vec::new(),
        first_release_date: Some(1_000_000_000 + id as i64),
    }
}

pub fn pool(len: u64) -> Vec<Game> {
    (0..len).map(game).collect()
}

/// Catalog that serves a fixed pool and counts calls.
pub struct FakeCatalog {
    pool: Result<Vec<Game>, u16>,
    delay: Duration,
    pub pool_fetches: AtomicUsize,
    pub searches: AtomicUsize,
}

impl FakeCatalog {
    pub fn with_pool(pool: Vec<Game>) -> Self {
        Self {
            pool: Ok(pool),
            delay: Duration::ZERO,
            pool_fetches: AtomicUsize::new(0),
            searches: AtomicUsize::new(0),
        }
    }

    /// Every pool fetch fails with the given upstream status.
    pub fn failing(status: u16) -> Self {
        Self {
            pool: Err(status),
            ..Self::with_pool(Vec::new())
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn pool_fetches(&self) -> usize {
        self.pool_fetches.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_pool(&self, _as_of: NaiveDate) -> Result<Vec<Game>, CatalogError> {
        self.pool_fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.pool {
            Ok(pool) => Ok(pool.clone()),
            Err(status) => Err(CatalogError::Upstream {
                status: *status,
                details: "catalog unavailable".to_owned(),
            }),
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Game>, CatalogError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let needle = query.as_str().to_lowercase();
        let pool = self.pool.as_ref().map(Vec::as_slice).unwrap_or_default();
        Ok(pool
            .iter()
            .filter(|g| g.name.to_lowercase().contains(&needle))
            .take(10)
            .cloned()
            .collect())
    }
}

/// In-memory [`GridStore`] standing in for Postgres.
#[derive(Default)]
pub struct MemoryGridStore {
    rows: Mutex<HashMap<NaiveDate, Vec<Game>>>,
}

impl MemoryGridStore {
    pub fn row(&self, date: NaiveDate) -> Option<Vec<Game>> {
        self.rows.lock().unwrap().get(&date).cloned()
    }

    /// Poll until a row for `date` appears; durable writes are detached.
    pub async fn wait_for_row(&self, date: NaiveDate) -> Vec<Game> {
        for _ in 0..200 {
            if let Some(games) = self.row(date) {
                return games;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no grid row for {date}");
    }
}

#[async_trait]
impl GridStore for MemoryGridStore {
    async fn load(&self, date: NaiveDate) -> anyhow::Result<Option<Vec<Game>>> {
        Ok(self.row(date))
    }

    async fn insert_if_absent(&self, date: NaiveDate, games: &[Game]) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&date) {
            return Ok(false);
        }
        rows.insert(date, games.to_vec());
        Ok(true)
    }

    fn kind(&self) -> &'static str {
        "memory-test"
    }
}

pub fn grid_service(
    catalog: Arc<FakeCatalog>,
    store: Option<Arc<MemoryGridStore>>,
) -> GridService {
    let store = store.map(|s| s as Arc<dyn GridStore>);
    GridService::new(GridCache::new(store), catalog)
}

/// App state over fakes with the default search limit of 30 per minute.
pub fn app_state(catalog: Arc<FakeCatalog>) -> AppState {
    AppState::new(
        grid_service(catalog.clone(), None),
        catalog,
        RateLimiter::new(30, Duration::from_secs(60)),
        None,
    )
}
