//! The IGDB client and token exchange against a local stand-in for the
//! identity provider and catalog API.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use chrono::NaiveDate;
use gamegrid::catalog::{
    CatalogError, CatalogSource, IgdbClient, PoolFilter, SearchQuery, TokenManager,
    TwitchCredentials,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const CLIENT_ID: &str = "client-abc";
const CLIENT_SECRET: &str = "hunter2";

const SEARCH_BODY: &str = r#"[{"id": 1, "name": "Portal", "cover": {"url": "//images.igdb.com/igdb/image/upload/t_thumb/a.jpg"}, "first_release_date": 1192060800}]"#;

const POOL_BODY: &str = r#"[
    {"id": 7, "name": "Celeste", "cover": {"url": "//images.igdb.com/igdb/image/upload/t_thumb/c7.jpg"},
     "screenshots": [{"url": "//images.igdb.com/igdb/image/upload/t_thumb/s7.jpg"}], "total_rating_count": 900},
    {"id": 3, "name": "Hades", "cover": {"url": "//images.igdb.com/igdb/image/upload/t_thumb/c3.jpg"},
     "screenshots": [], "total_rating_count": 2400},
    {"id": 9, "name": "Hades", "cover": {"url": "//images.igdb.com/igdb/image/upload/t_thumb/c9.jpg"},
     "screenshots": [], "total_rating_count": 15}
]"#;

/// What the stand-in upstream does and what it has seen.
struct Upstream {
    token_status: StatusCode,
    games_status: StatusCode,
    games_body: &'static str,
    /// Bearer value answered with 401 regardless of `games_status`.
    rejected_bearer: Option<&'static str>,
    exchanges: AtomicUsize,
    token_params: Mutex<Vec<HashMap<String, String>>>,
    game_requests: Mutex<Vec<(Option<String>, Option<String>, String)>>,
}

impl Upstream {
    fn new(games_body: &'static str) -> Self {
        Self {
            token_status: StatusCode::OK,
            games_status: StatusCode::OK,
            games_body,
            rejected_bearer: None,
            exchanges: AtomicUsize::new(0),
            token_params: Mutex::new(Vec::new()),
            game_requests: Mutex::new(Vec::new()),
        }
    }

    fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    fn game_requests(&self) -> Vec<(Option<String>, Option<String>, String)> {
        self.game_requests.lock().unwrap().clone()
    }
}

async fn token(
    State(upstream): State<Arc<Upstream>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let n = upstream.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
    upstream.token_params.lock().unwrap().push(params);
    if upstream.token_status != StatusCode::OK {
        return (upstream.token_status, "invalid client").into_response();
    }
    axum::Json(serde_json::json!({
        "access_token": format!("token-{n}"),
        "expires_in": 5_000_000,
        "token_type": "bearer",
    }))
    .into_response()
}

async fn games(State(upstream): State<Arc<Upstream>>, headers: HeaderMap, body: Bytes) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let bearer = header("authorization");
    upstream.game_requests.lock().unwrap().push((
        header("client-id"),
        bearer.clone(),
        String::from_utf8_lossy(&body).into_owned(),
    ));

    if let Some(rejected) = upstream.rejected_bearer
        && bearer.as_deref() == Some(rejected)
    {
        return (StatusCode::UNAUTHORIZED, "token expired").into_response();
    }
    if upstream.games_status != StatusCode::OK {
        return (upstream.games_status, "slow").into_response();
    }
    (
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        upstream.games_body,
    )
        .into_response()
}

/// Serve `upstream` on an ephemeral port and build a client pointed at it.
async fn client_for(upstream: Arc<Upstream>) -> IgdbClient {
    let app = Router::new()
        .route("/oauth2/token", post(token))
        .route("/v4/games", post(games))
        .with_state(upstream);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
        .unwrap();
    let tokens = Arc::new(TokenManager::new(
        TwitchCredentials::new(
            http.clone(),
            format!("{base}/oauth2/token"),
            CLIENT_ID.to_owned(),
            CLIENT_SECRET.to_owned(),
        ),
        Duration::from_secs(60),
    ));
    IgdbClient::new(
        http,
        format!("{base}/v4/"),
        CLIENT_ID.to_owned(),
        tokens,
        PoolFilter {
            min_rating: 70.0,
            min_rating_count: 50,
        },
    )
}

fn query(text: &str) -> SearchQuery {
    SearchQuery::parse(text).unwrap()
}

#[tokio::test]
async fn search_decodes_hits_and_sends_credentials() {
    let upstream = Arc::new(Upstream::new(SEARCH_BODY));
    let client = client_for(upstream.clone()).await;

    let hits = client.search(&query("portal")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 1);
    assert_eq!(hits[0].name, "Portal");
    assert_eq!(
        hits[0].cover.as_deref(),
        Some("https://images.igdb.com/igdb/image/upload/t_cover_small/a.jpg")
    );
    assert_eq!(hits[0].first_release_date, Some(1192060800));

    client.search(&query("portal")).await.unwrap();
    assert_eq!(upstream.exchanges(), 1);

    let params = upstream.token_params.lock().unwrap()[0].clone();
    assert_eq!(params["client_id"], CLIENT_ID);
    assert_eq!(params["client_secret"], CLIENT_SECRET);
    assert_eq!(params["grant_type"], "client_credentials");

    let (client_id, bearer, body) = upstream.game_requests()[0].clone();
    assert_eq!(client_id.as_deref(), Some(CLIENT_ID));
    assert_eq!(bearer.as_deref(), Some("Bearer token-1"));
    assert!(body.starts_with(r#"search "portal";"#), "{body}");
    assert!(body.contains("limit 10;"), "{body}");
}

#[tokio::test]
async fn pool_is_sorted_deduplicated_and_resized() {
    let upstream = Arc::new(Upstream::new(POOL_BODY));
    let client = client_for(upstream.clone()).await;

    let pool = client
        .fetch_pool(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap())
        .await
        .unwrap();
    let ids: Vec<u64> = pool.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![3, 7]);
    assert_eq!(
        pool[1].cover.as_deref(),
        Some("https://images.igdb.com/igdb/image/upload/t_cover_big/c7.jpg")
    );
    assert_eq!(
        pool[1].screenshots,
        vec!["https://images.igdb.com/igdb/image/upload/t_screenshot_big/s7.jpg"]
    );

    let (_, _, body) = upstream.game_requests()[0].clone();
    // 2025-06-01T00:00:00Z
    assert!(body.contains("first_release_date < 1748736000"), "{body}");
    assert!(body.contains("limit 500;"), "{body}");
}

#[tokio::test]
async fn upstream_failure_keeps_status_and_body() {
    let upstream = Arc::new(Upstream {
        games_status: StatusCode::TOO_MANY_REQUESTS,
        ..Upstream::new(POOL_BODY)
    });
    let client = client_for(upstream.clone()).await;

    let err = client
        .fetch_pool(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap())
        .await
        .unwrap_err();
    match err {
        CatalogError::Upstream { status, details } => {
            assert_eq!(status, 429);
            assert_eq!(details, "slow");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }

    // A non-auth failure leaves the token in place.
    let _ = client.search(&query("portal")).await;
    assert_eq!(upstream.exchanges(), 1);
}

#[tokio::test]
async fn unauthorized_response_forces_a_new_exchange() {
    let upstream = Arc::new(Upstream {
        rejected_bearer: Some("Bearer token-1"),
        ..Upstream::new(SEARCH_BODY)
    });
    let client = client_for(upstream.clone()).await;

    let err = client.search(&query("portal")).await.unwrap_err();
    assert!(matches!(err, CatalogError::Upstream { status: 401, .. }), "{err:?}");
    assert_eq!(upstream.exchanges(), 1);

    let hits = client.search(&query("portal")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(upstream.exchanges(), 2);
    let (_, bearer, _) = upstream.game_requests()[1].clone();
    assert_eq!(bearer.as_deref(), Some("Bearer token-2"));
}

#[tokio::test]
async fn rejected_exchange_is_a_token_error() {
    let upstream = Arc::new(Upstream {
        token_status: StatusCode::BAD_REQUEST,
        ..Upstream::new(SEARCH_BODY)
    });
    let client = client_for(upstream.clone()).await;

    let err = client.search(&query("portal")).await.unwrap_err();
    match err {
        CatalogError::Token(reason) => {
            assert!(reason.contains("400"), "{reason}");
            assert!(reason.contains("invalid client"), "{reason}");
        }
        other => panic!("expected token error, got {other:?}"),
    }
    assert!(upstream.game_requests().is_empty());
}

#[tokio::test]
async fn undecodable_body_is_a_parse_error() {
    let upstream = Arc::new(Upstream::new(r#"[{"id": "seven", "name": "Celeste"}]"#));
    let client = client_for(upstream).await;

    let err = client.search(&query("celeste")).await.unwrap_err();
    match err {
        CatalogError::Parse { url, source } => {
            assert!(url.ends_with("/v4/games"), "{url}");
            assert!(source.to_string().contains("[0].id"), "{source}");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}
