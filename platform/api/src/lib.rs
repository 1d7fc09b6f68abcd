//! Typed REST client for the HR backend.
//!
//! Every call is a fresh round trip: no retry, no caching, no request
//! deduplication. Non-2xx responses surface as [`ApiError::Status`] carrying
//! the status code and the raw response body.

mod client;
mod export;
mod list;

use thiserror::Error;

pub use client::{ApiClient, ClientConfig, DEFAULT_BASE_URL};
pub use export::{ExportFile, filename_from_disposition};
pub use list::decode_list;

/// Shared client result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response from {path}")]
    EmptyBody { path: String },
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "TRANSPORT",
            ApiError::Status { .. } => "HTTP_STATUS",
            ApiError::Decode { .. } => "DECODE",
            ApiError::EmptyBody { .. } => "EMPTY_BODY",
            ApiError::InvalidUrl(_) => "INVALID_URL",
        }
    }

    /// HTTP status for server-side rejections, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub(crate) fn decode(path: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_embed_code_and_body() {
        let err = ApiError::Status {
            status: 422,
            body: r#"{"detail":"name required"}"#.into(),
        };
        assert_eq!(err.to_string(), r#"HTTP 422: {"detail":"name required"}"#);
        assert_eq!(err.code(), "HTTP_STATUS");
        assert_eq!(err.status(), Some(422));
        assert!(!err.is_not_found());
    }

    #[test]
    fn non_http_errors_have_no_status() {
        let err = ApiError::InvalidUrl("nope".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.code(), "INVALID_URL");
    }
}
