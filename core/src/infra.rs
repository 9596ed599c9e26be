//! Typed calls for the infra API, layered on `ApiClient`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::request::RequestOptions;
use crate::transport::Transport;
use crate::types::{
    Ack, BuildRequest, CleanupReport, Container, DeployRequest, Health, Metrics, Queued,
    RollbackRequest, TestLease,
};

/// Everything except unreserved characters is escaped inside a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

#[derive(Debug, Clone)]
pub struct InfraClient<T> {
    api: ApiClient<T>,
}

#[cfg(feature = "reqwest")]
impl InfraClient<crate::transport::ReqwestTransport> {
    pub fn with_reqwest(config: Config) -> Self {
        Self::new(ApiClient::with_reqwest(config))
    }
}

impl<T> InfraClient<T> {
    pub fn new(api: ApiClient<T>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }
}

impl<T: Transport> InfraClient<T> {
    pub async fn health(&self) -> Result<Health, ApiError> {
        self.api.get("/health").await?.into_typed()
    }

    pub async fn list_containers(&self) -> Result<Vec<Container>, ApiError> {
        self.api.get("/containers").await?.into_typed()
    }

    pub async fn start_container(&self, name: &str) -> Result<Ack, ApiError> {
        self.post(&format!("/containers/{}/start", segment(name))).await
    }

    pub async fn stop_container(&self, name: &str) -> Result<Ack, ApiError> {
        self.post(&format!("/containers/{}/stop", segment(name))).await
    }

    pub async fn delete_container(&self, name: &str) -> Result<Ack, ApiError> {
        self.api
            .delete(&format!("/containers/{}", segment(name)))
            .await?
            .into_typed()
    }

    /// Start `name` in test mode. Without `ttl_secs` the server default applies.
    pub async fn test_container(
        &self,
        name: &str,
        ttl_secs: Option<u64>,
    ) -> Result<TestLease, ApiError> {
        let mut path = format!("/containers/{}/test", segment(name));
        if let Some(ttl) = ttl_secs {
            path.push_str(&format!("?ttl={ttl}"));
        }
        self.post(&path).await
    }

    pub async fn build(&self, request: &BuildRequest) -> Result<Queued, ApiError> {
        self.api.post_json("/build", request).await?.into_typed()
    }

    pub async fn deploy(&self, request: &DeployRequest) -> Result<Queued, ApiError> {
        self.api.post_json("/deploy", request).await?.into_typed()
    }

    pub async fn rollback(&self, request: &RollbackRequest) -> Result<Ack, ApiError> {
        self.api.post_json("/rollback", request).await?.into_typed()
    }

    pub async fn cleanup_tests(&self) -> Result<CleanupReport, ApiError> {
        self.post("/cleanup/tests").await
    }

    pub async fn metrics(&self) -> Result<Metrics, ApiError> {
        self.api.get("/metrics").await?.into_typed()
    }

    async fn post<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.api
            .request(path, RequestOptions::new().method(HttpMethod::Post))
            .await?
            .into_typed()
    }
}

fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}
