//! Builders for the catalog's filter/sort/limit query language, and
//! validation of user-supplied search text before it is embedded in one.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Candidates requested per pool fetch.
pub const POOL_LIMIT: u32 = 500;
/// Hits returned per search.
pub const SEARCH_LIMIT: u32 = 10;
/// Shortest accepted search, counted after sanitising.
pub const MIN_QUERY_CHARS: usize = 2;
/// Longest accepted search, counted after sanitising.
pub const MAX_QUERY_CHARS: usize = 100;

/// Thresholds a game must clear to enter the daily pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolFilter {
    pub min_rating: f64,
    pub min_rating_count: u32,
}

/// Query for the pool of grid candidates released before `as_of`'s month.
///
/// Sorted by rating count, a popularity proxy, so the pool order is stable
/// from one day to the next.
pub fn pool_query(filter: PoolFilter, as_of: NaiveDate) -> String {
    format!(
        "fields name, cover.url, screenshots.url, first_release_date, total_rating_count; \
         where first_release_date < {released_before} \
         & total_rating >= {min_rating} \
         & total_rating_count >= {min_count} \
         & cover != null & screenshots != null; \
         sort total_rating_count desc; \
         limit {POOL_LIMIT};",
        released_before = month_start(as_of),
        min_rating = filter.min_rating,
        min_count = filter.min_rating_count,
    )
}

/// Free-text search returning the minimal fields needed for guess candidates.
pub fn search_query(query: &SearchQuery) -> String {
    format!(
        "search \"{}\"; fields name, first_release_date, cover.url; limit {SEARCH_LIMIT};",
        query.as_str()
    )
}

/// Unix timestamp (seconds) of UTC midnight on the first day of `date`'s month.
pub fn month_start(date: NaiveDate) -> i64 {
    date.with_day(1)
        .and_then(|first| first.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Remove characters that could terminate the quoted search string or the
/// statement around it, plus control characters, then trim. Tabs and line
/// breaks become spaces so the words on either side stay separate.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            '"' | '\\' | ';' => None,
            c if c.is_whitespace() => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Search query must be at least {} characters", MIN_QUERY_CHARS)]
    TooShort,
    #[error("Search query must be at most {} characters", MAX_QUERY_CHARS)]
    TooLong,
}

/// Search text that has been sanitised and length-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let clean = sanitize(raw);
        let len = clean.chars().count();
        if len < MIN_QUERY_CHARS {
            Err(QueryError::TooShort)
        } else if len > MAX_QUERY_CHARS {
            Err(QueryError::TooLong)
        } else {
            Ok(Self(clean))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
