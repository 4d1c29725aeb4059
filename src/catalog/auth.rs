//! Bearer token lifecycle for the catalog API.
//!
//! Tokens come from an OAuth client-credentials exchange. One token is held
//! at a time and reused until shortly before its advertised expiry. Two
//! callers that both observe an expired token may both renew it; the
//! provider tolerates that, so renewals are not serialised.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::catalog::errors::CatalogError;
use crate::catalog::json::decode_with_context;
use crate::utils::fmt_duration;

/// A freshly issued token and its lifetime in seconds.
#[derive(Deserialize, custom_debug_derive::Debug)]
pub struct IssuedToken {
    #[debug(skip)]
    pub access_token: String,
    pub expires_in: u64,
}

/// Performs the credential exchange against the identity provider.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn exchange(&self) -> Result<IssuedToken, CatalogError>;
}

/// Client-credentials grant against the Twitch identity provider.
#[derive(custom_debug_derive::Debug)]
pub struct TwitchCredentials {
    #[debug(skip)]
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    #[debug(skip)]
    client_secret: String,
}

impl TwitchCredentials {
    pub fn new(
        http: reqwest::Client,
        token_url: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            http,
            token_url,
            client_id,
            client_secret,
        }
    }
}

#[async_trait]
impl CredentialExchange for TwitchCredentials {
    async fn exchange(&self) -> Result<IssuedToken, CatalogError> {
        let url = url::Url::parse_with_params(
            &self.token_url,
            [
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ],
        )
        .map_err(|e| CatalogError::Token(format!("invalid token URL: {e}")))?;

        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| CatalogError::Token(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CatalogError::Token(e.to_string()))?;
        if !status.is_success() {
            return Err(CatalogError::Token(format!("{status}: {body}")));
        }

        decode_with_context(&body).map_err(|e| CatalogError::Token(e.to_string()))
    }
}

/// Ceiling on an issued lifetime; larger values from the provider are clamped.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400 * 365);

#[derive(custom_debug_derive::Debug)]
struct AccessToken {
    #[debug(skip)]
    value: String,
    expires_at: Instant,
}

/// Caches one bearer token, renewing it through `E` once it lapses.
#[derive(Debug)]
pub struct TokenManager<E> {
    exchange: E,
    margin: Duration,
    current: RwLock<Option<AccessToken>>,
}

impl<E: CredentialExchange> TokenManager<E> {
    /// `margin` is subtracted from every issued lifetime so a token never
    /// lapses while a request that carries it is still in flight.
    pub fn new(exchange: E, margin: Duration) -> Self {
        Self {
            exchange,
            margin,
            current: RwLock::new(None),
        }
    }

    /// Return the cached token, exchanging credentials first if it is
    /// missing or expired. Exchange failures propagate; there is no retry.
    pub async fn get_token(&self) -> Result<String, CatalogError> {
        {
            let current = self.current.read().await;
            if let Some(token) = current.as_ref()
                && Instant::now() < token.expires_at
            {
                return Ok(token.value.clone());
            }
        }

        debug!("Catalog access token missing or expired, exchanging credentials");
        let issued = self.exchange.exchange().await?;
        let lifetime = Duration::from_secs(issued.expires_in)
            .min(MAX_TOKEN_LIFETIME)
            .saturating_sub(self.margin);
        let value = issued.access_token;

        *self.current.write().await = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        info!(lifetime = fmt_duration(lifetime), "Catalog access token renewed");
        Ok(value)
    }

    /// Drop the cached token so the next call exchanges credentials again.
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }
}
