//! Common error types for the choir services

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Common result type for choir operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the choir services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure reported by the spreadsheet backend or the transport to it
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Shape of an error coming back from the spreadsheet API.
///
/// Carries whichever of HTTP status, transport error code and message the
/// failure produced. Only these three fields take part in retry decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamError {
    /// HTTP status of the upstream response, if one was received
    pub status: Option<u16>,
    /// Transport error code such as `ETIMEDOUT`
    pub code: Option<String>,
    /// Human readable message (response body or transport error text)
    pub message: String,
}

impl UpstreamError {
    /// Error for a non-success HTTP response
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code: None,
            message: message.into(),
        }
    }

    /// Error raised below HTTP (connect, DNS, timeout)
    pub fn transport(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Error carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// True when the upstream is throttling us (429 or a quota/rate-limit message)
    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429)
            || self.message.contains("quota")
            || self.message.contains("rate limit")
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.code) {
            (Some(status), _) => write!(f, "HTTP {}: {}", status, self.message),
            (None, Some(code)) => write!(f, "{}: {}", code, self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for UpstreamError {}

const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
const RETRYABLE_CODES: [&str; 3] = ["ECONNRESET", "ENOTFOUND", "ETIMEDOUT"];
const RETRYABLE_MESSAGE_FRAGMENTS: [&str; 6] = [
    "quota",
    "rate limit",
    "timeout",
    "TIMEOUT",
    "ECONNRESET",
    "ETIMEDOUT",
];

/// Decide whether an upstream failure is transient.
///
/// Retryable iff the status is 429 or a 5xx gateway/server status, the
/// transport code is a connection reset / DNS / timeout code, or the message
/// mentions quota, rate limiting or a timeout. Message matching is
/// case-sensitive.
pub fn is_retryable_error(error: &UpstreamError) -> bool {
    if let Some(status) = error.status {
        if RETRYABLE_STATUSES.contains(&status) {
            return true;
        }
    }

    if let Some(code) = error.code.as_deref() {
        if RETRYABLE_CODES.contains(&code) {
            return true;
        }
    }

    RETRYABLE_MESSAGE_FRAGMENTS
        .iter()
        .any(|fragment| error.message.contains(fragment))
}

/// Errors that know whether retrying the failed operation can help
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for UpstreamError {
    fn is_retryable(&self) -> bool {
        is_retryable_error(self)
    }
}

impl Retryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Upstream(upstream) => is_retryable_error(upstream),
            _ => false,
        }
    }
}
