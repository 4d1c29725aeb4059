use chrono::{NaiveDate, Utc};
use std::time::{Duration, Instant};

/// Render a `Duration` with automatic unit scaling, e.g. `1.94ms`, `2.34s`.
pub fn fmt_duration(d: Duration) -> String {
    format!("{d:.2?}")
}

/// Warn when more than `threshold` has passed since `start`.
pub fn log_if_slow(start: Instant, threshold: Duration, operation: &str) {
    let elapsed = start.elapsed();
    if elapsed > threshold {
        tracing::warn!(
            operation,
            duration = fmt_duration(elapsed),
            threshold = fmt_duration(threshold),
            "Slow operation"
        );
    }
}

/// The current calendar date in UTC, which decides whose grid is served.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
