use crate::catalog::{CatalogSource, IgdbClient, TokenManager, TwitchCredentials};
use crate::config::Config;
use crate::data::{GridStore, PgGridStore};
use crate::grid::GridService;
use crate::grid::cache::GridCache;
use crate::state::AppState;
use crate::utils::fmt_duration;
use crate::web::create_router;
use crate::web::middleware::rate_limit::RateLimiter;
use anyhow::Context;
use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    app_state: AppState,
    shutdown: CancellationToken,
}

impl App {
    /// Build every component from `config`.
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let db_pool = match config.database_url() {
            Some(url) => Some(Self::connect_database(url).await?),
            None => {
                warn!("DATABASE_URL not set, grids will not survive restarts");
                None
            }
        };

        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let tokens = Arc::new(TokenManager::new(
            TwitchCredentials::new(
                http.clone(),
                config.twitch_token_url.clone(),
                config.igdb_client_id.clone(),
                config.igdb_client_secret.clone(),
            ),
            config.token_expiry_margin,
        ));
        let catalog: Arc<dyn CatalogSource> = Arc::new(IgdbClient::new(
            http,
            config.igdb_base_url.clone(),
            config.igdb_client_id.clone(),
            tokens,
            config.pool_filter(),
        ));

        let store = db_pool
            .clone()
            .map(|pool| Arc::new(PgGridStore::new(pool)) as Arc<dyn GridStore>);
        let grids = GridService::new(GridCache::new(store), catalog.clone());
        let search_limiter = RateLimiter::new(config.search_rate_limit, config.search_rate_window);

        info!(
            store = grids.cache().store_kind(),
            search_rate_limit = config.search_rate_limit,
            search_rate_window = fmt_duration(config.search_rate_window),
            upstream_timeout = fmt_duration(config.upstream_timeout),
            "application components initialised"
        );

        Ok(App {
            app_state: AppState::new(grids, catalog, search_limiter, db_pool),
            config,
            shutdown: CancellationToken::new(),
        })
    }

    async fn connect_database(url: &str) -> Result<sqlx::PgPool, anyhow::Error> {
        let connect_options = PgConnectOptions::from_str(url)
            .context("Failed to parse database URL")?
            .log_statements(tracing::log::LevelFilter::Debug)
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(1));

        let pool = PgPoolOptions::new()
            .min_connections(0)
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(4))
            .idle_timeout(Duration::from_secs(60 * 2))
            .max_lifetime(Duration::from_secs(60 * 30))
            .connect_with(connect_options)
            .await
            .context("Failed to create database pool")?;

        info!(
            max_connections = 4,
            acquire_timeout = "4s",
            idle_timeout = "2m",
            "database pool established"
        );

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations completed successfully");

        Ok(pool)
    }

    /// Serve HTTP until a shutdown signal arrives, then drain within
    /// `SHUTDOWN_TIMEOUT`.
    pub async fn run(self) -> ExitCode {
        let sweeper = self.app_state.search_limiter.spawn_sweeper(
            self.config.rate_limit_sweep_interval,
            self.shutdown.clone(),
        );

        let address = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = match TcpListener::bind(address).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(%address, error = ?e, "Failed to bind listener");
                return ExitCode::FAILURE;
            }
        };
        info!(%address, "web server listening");

        let router = create_router(self.app_state);
        let shutdown = self.shutdown.clone();
        let mut server = tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
        });

        tokio::select! {
            result = &mut server => {
                self.shutdown.cancel();
                let _ = sweeper.await;
                return match result {
                    Ok(Ok(())) => ExitCode::SUCCESS,
                    Ok(Err(e)) => {
                        error!(error = ?e, "web server failed");
                        ExitCode::FAILURE
                    }
                    Err(e) => {
                        error!(error = ?e, "web server task panicked");
                        ExitCode::FAILURE
                    }
                };
            }
            _ = shutdown_signal() => {}
        }

        info!(
            timeout = fmt_duration(self.config.shutdown_timeout),
            "shutdown requested, draining connections"
        );
        self.shutdown.cancel();

        match tokio::time::timeout(self.config.shutdown_timeout, server).await {
            Ok(Ok(Ok(()))) => {
                let _ = sweeper.await;
                info!("graceful shutdown complete");
                ExitCode::SUCCESS
            }
            Ok(Ok(Err(e))) => {
                error!(error = ?e, "web server failed during shutdown");
                ExitCode::FAILURE
            }
            Ok(Err(e)) => {
                error!(error = ?e, "web server task panicked during shutdown");
                ExitCode::FAILURE
            }
            Err(_) => {
                warn!("graceful shutdown timed out, exiting");
                ExitCode::FAILURE
            }
        }
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = ?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received SIGTERM");
            }
            Err(e) => {
                error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
