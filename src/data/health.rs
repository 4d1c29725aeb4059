//! Liveness probe for the durable store.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::time::{Duration, Instant};

/// Round-trip a trivial query and report how long it took.
pub async fn ping(pool: &PgPool) -> Result<Duration> {
    let start = Instant::now();
    let one: i32 = sqlx::query_scalar("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database ping failed")?;
    anyhow::ensure!(one == 1, "Database ping returned {one}");
    Ok(start.elapsed())
}
