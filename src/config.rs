//! Environment-driven configuration.
//!
//! Keys are read from the process environment (after `.env` is merged by
//! `dotenvy`) and matched case-insensitively against the field names, so
//! `IGDB_CLIENT_ID` fills `igdb_client_id`. Durations accept a bare number
//! of seconds or a unit-suffixed string such as `500ms`, `10s` or `5m`.

use figment::value::UncasedStr;
use figment::{Figment, providers::Env};
use fundu::{DurationParser, TimeUnit};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::catalog::PoolFilter;

#[derive(Clone, Deserialize, custom_debug_derive::Debug)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Postgres connection string. Unset or empty selects memory-only caching.
    #[serde(default)]
    #[debug(skip)]
    pub database_url: Option<String>,

    pub igdb_client_id: String,
    #[debug(skip)]
    pub igdb_client_secret: String,
    #[serde(default = "default_igdb_base_url")]
    pub igdb_base_url: String,
    #[serde(default = "default_twitch_token_url")]
    pub twitch_token_url: String,
    #[serde(
        default = "default_upstream_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub upstream_timeout: Duration,
    #[serde(
        default = "default_token_expiry_margin",
        deserialize_with = "deserialize_duration"
    )]
    pub token_expiry_margin: Duration,

    #[serde(default = "default_pool_min_rating")]
    pub pool_min_rating: f64,
    #[serde(default = "default_pool_min_rating_count")]
    pub pool_min_rating_count: u32,

    #[serde(default = "default_search_rate_limit")]
    pub search_rate_limit: u32,
    #[serde(
        default = "default_search_rate_window",
        deserialize_with = "deserialize_duration"
    )]
    pub search_rate_window: Duration,
    #[serde(
        default = "default_rate_limit_sweep_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub rate_limit_sweep_interval: Duration,

    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
}

fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_igdb_base_url() -> String {
    "https://api.igdb.com/v4".to_string()
}
fn default_twitch_token_url() -> String {
    "https://id.twitch.tv/oauth2/token".to_string()
}
fn default_upstream_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_token_expiry_margin() -> Duration {
    Duration::from_secs(60)
}
fn default_pool_min_rating() -> f64 {
    70.0
}
fn default_pool_min_rating_count() -> u32 {
    50
}
fn default_search_rate_limit() -> u32 {
    30
}
fn default_search_rate_window() -> Duration {
    Duration::from_secs(60)
}
fn default_rate_limit_sweep_interval() -> Duration {
    Duration::from_secs(5 * 60)
}
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Railway's `RAILWAY_DEPLOYMENT_DRAINING_SECONDS` doubles as the
    /// shutdown timeout.
    pub fn load() -> Result<Self, figment::Error> {
        Self::from_figment(Figment::new().merge(Env::raw().map(|k| {
            if k == UncasedStr::new("RAILWAY_DEPLOYMENT_DRAINING_SECONDS") {
                "SHUTDOWN_TIMEOUT".into()
            } else {
                k.into()
            }
        })))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    /// The database URL, treating an empty value as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn pool_filter(&self) -> PoolFilter {
        PoolFilter {
            min_rating: self.pool_min_rating,
            min_rating_count: self.pool_min_rating_count,
        }
    }
}

fn parse_duration(input: &str) -> Result<Duration, String> {
    let parser = DurationParser::with_time_units(&[
        TimeUnit::MilliSecond,
        TimeUnit::Second,
        TimeUnit::Minute,
        TimeUnit::Hour,
    ]);
    let parsed = parser
        .parse(input.trim())
        .map_err(|e| format!("invalid duration '{input}': {e}"))?;
    Duration::try_from(parsed).map_err(|e| format!("invalid duration '{input}': {e}"))
}

/// Accepts integers (seconds) or strings parsed with `fundu`.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
