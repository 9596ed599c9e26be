//! The request helper.
//!
//! # Design
//! `ApiClient` holds a read-only `Config` and a `Transport`, and carries no
//! mutable state between calls. Every call is split the same way the wire
//! is: `build_request` produces the exact `HttpRequest`, the transport runs
//! it once, and `parse_response` turns the `HttpResponse` into an
//! `ApiResponse` or an `ApiError`. Both halves are pure, so they are tested
//! without a network.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{ApiError, Payload};
use crate::http::{set_header, HttpMethod, HttpRequest, HttpResponse};
use crate::request::{ApiResponse, RequestOptions};
use crate::transport::Transport;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Schemes that mark a path as an absolute URL.
const URL_SCHEMES: [&str; 2] = ["http://", "https://"];

#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    config: Config,
    transport: T,
}

#[cfg(feature = "reqwest")]
impl ApiClient<crate::transport::ReqwestTransport> {
    /// Client backed by a default `reqwest::Client`.
    pub fn with_reqwest(config: Config) -> Self {
        Self::new(config, crate::transport::ReqwestTransport::new())
    }
}

impl<T> ApiClient<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Absolute `http(s)` URLs pass through; anything else is appended to the
    /// base URL as-is.
    pub fn resolve_url(&self, path: &str) -> String {
        if has_url_scheme(path) {
            path.to_string()
        } else {
            format!("{}{}", self.config.base_url, path)
        }
    }

    /// Assemble the request exactly as it will be sent.
    ///
    /// Caller headers come first and are kept, except that `Content-Type`
    /// and (with a token configured) `Authorization` are always set by the
    /// helper and replace caller values of the same name.
    pub fn build_request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<HttpRequest, ApiError> {
        let RequestOptions { method, mut headers, body } = options;

        set_header(&mut headers, CONTENT_TYPE, JSON_MEDIA_TYPE.to_string());
        if let Some(token) = &self.config.auth_token {
            set_header(&mut headers, AUTHORIZATION, format!("Bearer {token}"));
        }

        Ok(HttpRequest {
            method,
            url: self.resolve_url(path),
            headers,
            body: body.map(|b| b.into_wire()).transpose()?,
        })
    }

    /// Normalize a response: JSON or text on 2xx, `ApiError::Status` otherwise.
    /// An empty body reads as an empty JSON object.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ApiResponse, ApiError> {
        parse_response(response)
    }
}

impl<T: Transport> ApiClient<T> {
    /// Build, send once, and parse.
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let request = self.build_request(path, options)?;
        let response = self.transport.execute(request).await?;
        parse_response(response)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(path, RequestOptions::new()).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(path, RequestOptions::new().method(HttpMethod::Delete)).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        let options = RequestOptions::new().method(HttpMethod::Post).json(body)?;
        self.request(path, options).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        let options = RequestOptions::new().method(HttpMethod::Put).json(body)?;
        self.request(path, options).await
    }
}

fn has_url_scheme(path: &str) -> bool {
    URL_SCHEMES.iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn parse_response(response: HttpResponse) -> Result<ApiResponse, ApiError> {
    let success = response.is_success();
    let status = response.status;

    let parsed = if response.body.trim().is_empty() {
        Ok(Value::Object(Map::new()))
    } else {
        serde_json::from_str::<Value>(&response.body)
    };

    match (parsed, success) {
        (Ok(value), true) => Ok(ApiResponse::Json(value)),
        (Ok(value), false) => Err(ApiError::Status {
            status,
            payload: Payload::Json(value),
        }),
        (Err(_), true) => Ok(ApiResponse::Text(response.body)),
        (Err(_), false) => Err(ApiError::Status {
            status,
            payload: Payload::Text(response.body),
        }),
    }
}
