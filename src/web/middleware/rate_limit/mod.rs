//! Fixed-window, per-client rate limiting for the search endpoint.
//!
//! Each client key owns a counter and the instant its window resets. The
//! first request after a reset opens a new window with a count of one;
//! requests beyond the ceiling inside a window are rejected without being
//! counted. A background sweep drops records whose window has passed so the
//! map stays bounded under a churn of distinct clients.

use axum::body::Body;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::web::error::ApiError;
use crate::web::middleware::client_ip::client_key;

#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    window_reset_at: Instant,
}

/// Shared limiter state. Clone-cheap; clones share the same records.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    records: Arc<DashMap<String, RateLimitRecord>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            limit,
            window,
        }
    }

    /// Count a request from `client_id` and report whether it is over the limit.
    pub fn is_limited(&self, client_id: &str) -> bool {
        self.is_limited_at(client_id, Instant::now())
    }

    pub fn is_limited_at(&self, client_id: &str, now: Instant) -> bool {
        let fresh = RateLimitRecord {
            count: 1,
            window_reset_at: now + self.window,
        };

        let Some(mut record) = self.records.get_mut(client_id) else {
            self.records.insert(client_id.to_owned(), fresh);
            return false;
        };

        if now >= record.window_reset_at {
            *record = fresh;
            return false;
        }
        if record.count >= self.limit {
            return true;
        }
        record.count += 1;
        false
    }

    /// Whole seconds until `client_id`'s window resets, at least one.
    pub fn retry_after_at(&self, client_id: &str, now: Instant) -> u64 {
        self.records
            .get(client_id)
            .map(|r| r.window_reset_at.saturating_duration_since(now))
            .map_or(1, |d| d.as_secs_f64().ceil() as u64)
            .max(1)
    }

    /// Remove records whose window has passed. Returns how many were dropped.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.window_reset_at > now);
        before.saturating_sub(self.records.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.records.len()
    }

    /// Sweep expired records every `interval` until `cancel` fires.
    pub fn spawn_sweeper(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip the immediate first tick
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = limiter.sweep_at(Instant::now());
                        debug!(
                            removed,
                            remaining = limiter.tracked_clients(),
                            "Rate limit records swept"
                        );
                    }
                }
            }
        })
    }
}

// -- Tower Layer + Service --

/// Applies a [`RateLimiter`] to every request passing through it.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: RateLimiter,
}

impl RateLimitLayer {
    pub fn new(limiter: RateLimiter) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: RateLimiter,
}

impl<S, ResBody> Service<Request> for RateLimitService<S>
where
    S: Service<Request, Response = Response<ResBody>> + Send + Clone + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    ResBody: Send + 'static,
    Body: Into<ResBody>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let key = client_key(req.headers(), req.extensions());
        let now = Instant::now();

        if self.limiter.is_limited_at(&key, now) {
            let retry_after = self.limiter.retry_after_at(&key, now);
            warn!(
                client = %key,
                path = %req.uri().path(),
                retry_after_secs = retry_after,
                "Rate limit exceeded"
            );
            let resp = ApiError::rate_limited(retry_after)
                .into_response()
                .map(Into::into);
            return Box::pin(async move { Ok(resp) });
        }

        Box::pin(self.inner.call(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn thirty_requests_pass_then_limited() {
        let limiter = RateLimiter::new(30, WINDOW);
        let start = Instant::now();

        for i in 0..30 {
            let now = start + Duration::from_secs(i);
            assert!(!limiter.is_limited_at("ip1", now), "request {i}");
        }
        assert!(limiter.is_limited_at("ip1", start + Duration::from_secs(59)));
        assert!(limiter.is_limited_at("ip1", start + Duration::from_secs(59)));
    }

    #[test]
    fn window_reset_clears_the_count() {
        let limiter = RateLimiter::new(30, WINDOW);
        let start = Instant::now();
        for _ in 0..31 {
            limiter.is_limited_at("ip1", start);
        }
        assert!(limiter.is_limited_at("ip1", start));

        let later = start + WINDOW + Duration::from_millis(1);
        for _ in 0..30 {
            assert!(!limiter.is_limited_at("ip1", later));
        }
        assert!(limiter.is_limited_at("ip1", later));
    }

    #[test]
    fn clients_are_counted_independently() {
        let limiter = RateLimiter::new(2, WINDOW);
        let now = Instant::now();
        assert!(!limiter.is_limited_at("a", now));
        assert!(!limiter.is_limited_at("a", now));
        assert!(limiter.is_limited_at("a", now));
        assert!(!limiter.is_limited_at("b", now));
    }

    #[test]
    fn rejected_requests_do_not_extend_the_window() {
        let limiter = RateLimiter::new(1, WINDOW);
        let start = Instant::now();
        assert!(!limiter.is_limited_at("a", start));
        assert!(limiter.is_limited_at("a", start + Duration::from_secs(30)));
        assert!(!limiter.is_limited_at("a", start + WINDOW));
    }

    #[test]
    fn retry_after_counts_down_to_reset() {
        let limiter = RateLimiter::new(1, WINDOW);
        let start = Instant::now();
        limiter.is_limited_at("a", start);
        assert_eq!(limiter.retry_after_at("a", start + Duration::from_secs(15)), 45);
        assert_eq!(limiter.retry_after_at("a", start + WINDOW), 1);
        assert_eq!(limiter.retry_after_at("missing", start), 1);
    }

    #[test]
    fn sweep_drops_only_expired_records() {
        let limiter = RateLimiter::new(30, WINDOW);
        let start = Instant::now();
        limiter.is_limited_at("old", start);
        limiter.is_limited_at("new", start + Duration::from_secs(30));

        assert_eq!(limiter.sweep_at(start + Duration::from_secs(61)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(limiter.records.contains_key("new"));
    }

    #[tokio::test]
    async fn sweeper_stops_on_cancel() {
        let limiter = RateLimiter::new(30, WINDOW);
        let cancel = CancellationToken::new();
        let handle = limiter.spawn_sweeper(Duration::from_millis(10), cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}
