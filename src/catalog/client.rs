//! HTTP client for the IGDB v4 API.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::catalog::auth::{CredentialExchange, TokenManager, TwitchCredentials};
use crate::catalog::errors::CatalogError;
use crate::catalog::json::decode_with_context;
use crate::catalog::models::{RawGame, build_pool};
use crate::catalog::query::{PoolFilter, SearchQuery, pool_query, search_query};
use crate::catalog::CatalogSource;
use crate::grid::models::Game;
use crate::utils::{fmt_duration, log_if_slow};

/// Pool fetches slower than this are logged.
const SLOW_POOL_FETCH: Duration = Duration::from_secs(3);

pub struct IgdbClient<E = TwitchCredentials> {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    tokens: Arc<TokenManager<E>>,
    filter: PoolFilter,
}

impl<E: CredentialExchange> IgdbClient<E> {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        client_id: String,
        tokens: Arc<TokenManager<E>>,
        filter: PoolFilter,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            tokens,
            filter,
        }
    }

    /// POST a query body to `endpoint` and decode the resulting game list.
    async fn query_games(&self, endpoint: &str, body: String) -> Result<Vec<RawGame>, CatalogError> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}/{endpoint}", self.base_url);

        debug!(url = %url, query = %body, "Querying catalog");
        let resp = self
            .http
            .post(&url)
            .header("Client-ID", &self.client_id)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(token)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                // Revoked or rotated credentials; the next request renews.
                self.tokens.invalidate().await;
            }
            warn!(url = %url, status = status.as_u16(), "Catalog request rejected");
            return Err(CatalogError::Upstream {
                status: status.as_u16(),
                details: text,
            });
        }

        decode_with_context(&text).map_err(|source| CatalogError::Parse { url, source })
    }
}

#[async_trait]
impl<E: CredentialExchange + 'static> CatalogSource for IgdbClient<E> {
    async fn fetch_pool(&self, as_of: NaiveDate) -> Result<Vec<Game>, CatalogError> {
        let start = Instant::now();
        let raw = self
            .query_games("games", pool_query(self.filter, as_of))
            .await?;
        let fetched = raw.len();
        let pool = build_pool(raw);

        log_if_slow(start, SLOW_POOL_FETCH, "catalog pool fetch");
        info!(
            %as_of,
            fetched,
            unique = pool.len(),
            duration = fmt_duration(start.elapsed()),
            "Fetched candidate pool"
        );
        Ok(pool)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Game>, CatalogError> {
        let raw = self.query_games("games", search_query(query)).await?;
        Ok(raw.into_iter().map(RawGame::into_search_hit).collect())
    }
}
