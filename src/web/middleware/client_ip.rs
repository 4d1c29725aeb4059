//! Client identity for per-client rate limiting.
//!
//! Priority: `CF-Connecting-IP` (Cloudflare) -> rightmost `X-Forwarded-For`
//! (appended by the edge proxy) -> socket peer address -> the shared
//! [`UNKNOWN_CLIENT`] bucket.
//!
//! The forwarded headers are trusted as-is. Without an allowlist of proxy
//! addresses a client talking to the server directly can choose its own key.

use axum::extract::ConnectInfo;
use http::{Extensions, HeaderMap};
use std::net::{IpAddr, SocketAddr};

/// Key shared by every caller whose address cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resolve the client IP from proxy headers or the connection's peer address.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    if let Some(ip) = header_str(headers, "cf-connecting-ip").and_then(|s| s.trim().parse().ok()) {
        return Some(ip);
    }

    if let Some(xff) = header_str(headers, "x-forwarded-for")
        && let Some(ip) = xff
            .rsplit(',')
            .next()
            .map(str::trim)
            .and_then(|s| s.parse::<IpAddr>().ok())
    {
        return Some(ip);
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Rate-limit key for a request: its IP, or [`UNKNOWN_CLIENT`].
pub fn client_key(headers: &HeaderMap, extensions: &Extensions) -> String {
    client_ip(headers, extensions).map_or_else(|| UNKNOWN_CLIENT.to_string(), |ip| ip.to_string())
}
