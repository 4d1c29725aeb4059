//! JSON error responses for the HTTP API.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, warn};
use ts_rs::TS;

use crate::catalog::{CatalogError, QueryError};

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ApiErrorCode {
    InvalidQuery,
    RateLimited,
    UpstreamError,
    InternalError,
    NotFound,
}

impl ApiErrorCode {
    fn status(self) -> StatusCode {
        match self {
            Self::InvalidQuery => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UpstreamError | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response: `{"code", "error", "details"}`.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ApiErrorBody {
    pub code: ApiErrorCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown")]
    pub details: Option<Value>,
}

#[derive(Debug)]
pub struct ApiError {
    code: ApiErrorCode,
    message: String,
    details: Option<Value>,
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            retry_after: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidQuery, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NotFound, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InternalError, message)
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            retry_after: Some(retry_after_secs),
            ..Self::new(
                ApiErrorCode::RateLimited,
                format!("Too many requests. Retry after {retry_after_secs} seconds."),
            )
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        Self::bad_request(e.to_string())
    }
}

/// Map a catalog failure to a server fault, logging it with `context`.
/// Upstream status and body are attached as details when present.
pub fn catalog_error(context: &str, e: CatalogError) -> ApiError {
    match &e {
        CatalogError::Upstream { status, details } => {
            warn!(status, details = %details, "{context} failed upstream");
            ApiError::new(ApiErrorCode::UpstreamError, format!("{context} failed"))
                .with_details(json!({ "status": status, "body": details }))
        }
        CatalogError::Token(reason) => {
            error!(reason = %reason, "{context} failed: catalog credentials rejected");
            ApiError::new(ApiErrorCode::UpstreamError, format!("{context} failed"))
                .with_details(json!({ "reason": reason }))
        }
        _ => {
            error!(error = ?e, "{context} failed");
            ApiError::internal_error(format!("{context} failed"))
                .with_details(json!({ "reason": e.to_string() }))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = ApiErrorBody {
            code: self.code,
            error: self.message,
            details: self.details,
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.retry_after
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}
