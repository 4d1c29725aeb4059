//! Durable storage of daily grids, one row per calendar date.
//!
//! Backed by the `daily_grids` table. Rows are written once with
//! insert-if-absent semantics and never updated, so the first writer for a
//! date wins and racing writers cannot tear the stored selection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::grid::models::Game;

/// Key-value persistence for grids, keyed by date.
#[async_trait]
pub trait GridStore: Send + Sync {
    /// Fetch the stored games for `date`, if a row exists.
    async fn load(&self, date: NaiveDate) -> Result<Option<Vec<Game>>>;

    /// Store `games` for `date` unless a row already exists.
    /// Returns `true` when this call created the row.
    async fn insert_if_absent(&self, date: NaiveDate, games: &[Game]) -> Result<bool>;

    /// Short backend name for status reporting.
    fn kind(&self) -> &'static str;
}

/// Postgres-backed [`GridStore`].
#[derive(Clone)]
pub struct PgGridStore {
    pool: PgPool,
}

impl PgGridStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[async_trait]
impl GridStore for PgGridStore {
    async fn load(&self, date: NaiveDate) -> Result<Option<Vec<Game>>> {
        let row: Option<Json<Vec<Game>>> =
            sqlx::query_scalar("SELECT games FROM daily_grids WHERE date = $1")
                .bind(date_key(date))
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Failed to load grid for {date}"))?;
        Ok(row.map(|Json(games)| games))
    }

    async fn insert_if_absent(&self, date: NaiveDate, games: &[Game]) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_grids (date, games)
            VALUES ($1, $2)
            ON CONFLICT (date) DO NOTHING
            "#,
        )
        .bind(date_key(date))
        .bind(Json(games))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to persist grid for {date}"))?;
        Ok(result.rows_affected() == 1)
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}
