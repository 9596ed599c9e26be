//! Error types for the request helper.
//!
//! # Design
//! A non-2xx response is an `ApiError::Status` carrying the status code and
//! the payload, parsed as JSON when possible and kept as raw text otherwise,
//! so callers can branch on either without string parsing. Network failures
//! keep the transport's own error as their source.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Body of a failed response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Json(value) => write!(f, "{value}"),
            Payload::Text(text) => f.write_str(text),
        }
    }
}

/// The underlying HTTP client failed to complete the round-trip. Displays
/// and chains exactly like the wrapped error.
#[derive(Debug)]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl TransportError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self(err.into())
    }

    /// Borrow the original error, e.g. to downcast to `reqwest::Error`.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Errors returned by `ApiClient` and `InfraClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {payload}")]
    Status { status: u16, payload: Payload },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A JSON success payload did not match the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// A typed call expected JSON but the server answered with plain text.
    #[error("expected a JSON response, got text: {body}")]
    UnexpectedText { body: String },
}

impl ApiError {
    /// HTTP status of an application failure, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            ApiError::Status { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

/// Errors while assembling a `Config` from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
}
