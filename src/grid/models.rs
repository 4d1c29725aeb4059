//! Puzzle entries and the per-date grid artifact.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A game as served to the puzzle client, either as a grid cell or a search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Game {
    /// Catalog identifier; guesses are compared against it.
    #[ts(type = "number")]
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,
    /// Unix timestamp, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub first_release_date: Option<i64>,
}

/// The selection for one calendar date. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyGrid {
    pub date: NaiveDate,
    pub games: Vec<Game>,
}

impl DailyGrid {
    pub fn new(date: NaiveDate, games: Vec<Game>) -> Self {
        Self { date, games }
    }

    /// Identifier handed to clients; the client derives a display number from it.
    pub fn grid_id(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
