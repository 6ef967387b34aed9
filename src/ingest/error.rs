//! Per-source failure taxonomy. Every variant is recovered locally: the
//! offending source contributes zero items and the cycle continues.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Connection refused, DNS failure, TLS error, ...
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// Body was not the expected JSON/XML shape.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Proxy answered but reported a failure in its `status` field.
    #[error("upstream reported error: {0}")]
    Upstream(String),
}

impl SourceError {
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if let Some(status) = e.status() {
            SourceError::HttpStatus(status.as_u16())
        } else if e.is_decode() {
            SourceError::Malformed(e.to_string())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}

/// A failed source as surfaced in pipeline reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

impl SourceFailure {
    pub fn new(source: &str, error: &SourceError) -> Self {
        Self {
            source: source.to_string(),
            error: error.to_string(),
        }
    }
}
