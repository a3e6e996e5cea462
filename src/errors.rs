//! The error taxonomy of §7: one `thiserror` enum carrying both an HTTP
//! status and a stable wire code. `anyhow` is used at the edges (config
//! loading, startup); anything crossing the public API surface is mapped
//! into this enum rather than leaking an `anyhow` chain.

use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("API key required")]
    ApiKeyRequired,

    #[error("API key invalid")]
    ApiKeyInvalid,

    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid timeout")]
    InvalidTimeout,

    #[error("invalid wait event")]
    InvalidWaitEvent,

    #[error("host resolves to a private, loopback, or link-local address")]
    SsrfBlocked,

    #[error("domain not found: {0}")]
    DomainNotFound(String),

    #[error("render timed out")]
    RenderTimeout,

    #[error("render failed: {0}")]
    RenderFailed(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("chrome unavailable")]
    ChromeUnavailable,

    #[error("pool exhausted")]
    PoolExhausted,

    #[error("pool shutting down")]
    PoolShuttingDown,
}

impl RenderError {
    /// The stable wire code returned in the error envelope.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::ApiKeyRequired => "API_KEY_REQUIRED",
            Self::ApiKeyInvalid => "API_KEY_INVALID",
            Self::InvalidRequestBody(_) => "INVALID_REQUEST_BODY",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::InvalidTimeout => "INVALID_TIMEOUT",
            Self::InvalidWaitEvent => "INVALID_WAIT_EVENT",
            Self::SsrfBlocked => "SSRF_BLOCKED",
            Self::DomainNotFound(_) => "DOMAIN_NOT_FOUND",
            Self::RenderTimeout => "RENDER_TIMEOUT",
            Self::RenderFailed(_) => "RENDER_FAILED",
            Self::FetchFailed(_) => "FETCH_FAILED",
            Self::ChromeUnavailable => "CHROME_UNAVAILABLE",
            Self::PoolExhausted => "POOL_EXHAUSTED",
            Self::PoolShuttingDown => "POOL_SHUTTING_DOWN",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::ApiKeyRequired => StatusCode::UNAUTHORIZED,
            Self::ApiKeyInvalid => StatusCode::FORBIDDEN,
            Self::InvalidRequestBody(_)
            | Self::InvalidUrl(_)
            | Self::InvalidTimeout
            | Self::InvalidWaitEvent
            | Self::DomainNotFound(_) => StatusCode::BAD_REQUEST,
            Self::SsrfBlocked => StatusCode::FORBIDDEN,
            Self::RenderTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::RenderFailed(_) | Self::FetchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ChromeUnavailable | Self::PoolExhausted | Self::PoolShuttingDown => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// A human-readable message that never leaks an internal exception chain.
    #[must_use]
    pub fn public_message(&self) -> String {
        self.to_string()
    }
}

/// Wire envelope for a failed request: `{ success: false, error: { code, message } }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

impl From<&RenderError> for ErrorBody {
    fn from(err: &RenderError) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: err.code(),
                message: err.public_message(),
            },
        }
    }
}

impl axum::response::IntoResponse for RenderError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = ErrorBody::from(&self);
        (status, axum::Json(body)).into_response()
    }
}
