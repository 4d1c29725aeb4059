//! Client for the external game catalog (IGDB).

pub mod auth;
pub mod client;
pub mod errors;
pub mod json;
pub mod models;
pub mod query;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::grid::models::Game;

pub use auth::{TokenManager, TwitchCredentials};
pub use client::IgdbClient;
pub use errors::CatalogError;
pub use query::{PoolFilter, QueryError, SearchQuery};

/// Source of grid candidates and guess suggestions.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Candidate pool for grids built on `as_of`: popularity-ordered and
    /// deduplicated by name.
    async fn fetch_pool(&self, as_of: NaiveDate) -> Result<Vec<Game>, CatalogError>;

    /// Up to ten title matches for a validated query.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Game>, CatalogError>;
}
