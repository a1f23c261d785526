//! Error types for upstream fetches and for the quote endpoint.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of one tier for one symbol.
///
/// These never reach the client directly; the aggregator logs them and moves
/// on to the next tier.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Connection refused, DNS failure, reset, client-side timeout...
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("Upstream returned {status} for {url}")]
    Status { status: u16, url: String },

    /// A tier, or one host attempt within it, did not finish in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Body could not be decoded or had an unexpected shape.
    #[error("Malformed payload: {0}")]
    Payload(String),

    /// Upstream answered but had no usable (non-zero) price.
    #[error("No usable price for {0}")]
    NoPrice(String),
}

impl FetchError {
    /// 網路層面的失敗 (連不上、逾時、非 2xx)
    ///
    /// A 404 is the upstream saying the symbol does not exist, which is a data
    /// answer rather than an outage.
    pub fn is_transport(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status != 404,
            FetchError::Payload(_) | FetchError::NoPrice(_) => false,
        }
    }

    /// 換到備援主機是否可能有不同的結果
    pub fn should_try_next_host(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_) | FetchError::Status { .. } | FetchError::Timeout(_)
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(why: reqwest::Error) -> Self {
        if why.is_decode() {
            FetchError::Payload(format!("{:?}", why))
        } else if let Some(status) = why.status() {
            FetchError::Status {
                status: status.as_u16(),
                url: why.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            FetchError::Transport(format!("{:?}", why))
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(why: serde_json::Error) -> Self {
        FetchError::Payload(why.to_string())
    }
}

/// Errors a caller of `/api/stock` can see.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    /// No symbol left after parsing the query string.
    #[error("Symbol(s) required")]
    InvalidInput,

    /// Every symbol came back without a usable quote.
    #[error("No data found for {0}")]
    NotFound(String),

    /// Every attempt for every symbol failed at the transport level.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl QuoteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            QuoteError::InvalidInput => StatusCode::BAD_REQUEST,
            QuoteError::NotFound(_) => StatusCode::NOT_FOUND,
            QuoteError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for QuoteError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));

        (self.status_code(), body).into_response()
    }
}
