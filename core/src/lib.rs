//! Request helper for the infra API.
//!
//! # Overview
//! `ApiClient` resolves a path against a configured base URL, attaches the
//! JSON content type and an optional bearer token, serializes structured
//! bodies, performs one round-trip through a `Transport`, and normalizes the
//! result into an `ApiResponse` or a typed `ApiError`. `InfraClient` layers
//! typed infra API calls on top.
//!
//! # Design
//! - Configuration is injected at construction and only read afterwards.
//! - Request building and response parsing are pure (host-does-IO split);
//!   only `Transport::execute` touches the network.
//! - Bodies are tagged (`RequestBody::Raw` / `RequestBody::Json`) so
//!   serialization follows the type, not a runtime check.
//! - Failures are values: `ApiError::Status` carries the status code and the
//!   JSON or text payload.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod infra;
pub mod request;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::Config;
pub use error::{ApiError, ConfigError, Payload, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use infra::InfraClient;
pub use request::{ApiResponse, RequestBody, RequestOptions};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{
    Ack, BuildRequest, CleanupReport, Container, DeployRequest, Health, Metrics, Queued,
    RollbackRequest, TestLease,
};
