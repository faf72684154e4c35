//! Snapshot Source Port (Driven Port)
//!
//! Interface for fetching the full ticker table in one request.

use async_trait::async_trait;

use crate::domain::ticker::TickerRecord;

/// Snapshot fetch failures.
///
/// HTTP statuses map onto the first seven variants; transport and body
/// failures use [`FetchError::Network`] and [`FetchError::InvalidBody`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// 400: the request was malformed.
    #[error("bad request")]
    BadRequest,
    /// 401: missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,
    /// 403: access to the resource is denied.
    #[error("forbidden")]
    Forbidden,
    /// 429: too many requests.
    #[error("rate limited")]
    RateLimited,
    /// 500: the server failed.
    #[error("server error")]
    ServerError,
    /// 503: the server is temporarily unavailable.
    #[error("service unavailable")]
    ServiceUnavailable,
    /// Any other non-success status.
    #[error("unexpected status {status}")]
    Unknown {
        /// HTTP status code.
        status: u16,
    },
    /// The request never produced a response (connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// A success response whose body is not a ticker array.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl FetchError {
    /// Map a non-success HTTP status.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            429 => Self::RateLimited,
            500 => Self::ServerError,
            503 => Self::ServiceUnavailable,
            status => Self::Unknown { status },
        }
    }

    /// Short label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Unknown { .. } => "unknown",
            Self::Network(_) => "network",
            Self::InvalidBody(_) => "invalid_body",
        }
    }
}

/// Port for fetching a full ticker snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch every ticker for the configured universe.
    async fn fetch_all(&self) -> Result<Vec<TickerRecord>, FetchError>;
}
