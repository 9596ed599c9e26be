use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEFAULT_TEST_TTL: u64 = 3600;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    pub status: String,
}

#[derive(Clone, Debug, Default)]
struct ContainerRecord {
    status: String,
    labels: HashMap<String, String>,
}

#[derive(Deserialize)]
pub struct BuildReq {
    pub path: String,
    pub tag: String,
}

#[derive(Deserialize)]
pub struct DeployReq {
    pub stack: String,
}

#[derive(Deserialize)]
pub struct RollbackReq {
    pub stack: String,
    pub tag: String,
}

#[derive(Deserialize)]
pub struct TestParams {
    pub ttl: Option<u64>,
}

/// In-memory stand-in for the docker host behind the infra API.
#[derive(Debug)]
pub struct AppState {
    token: String,
    default_ttl: u64,
    stacks: BTreeSet<String>,
    containers: RwLock<BTreeMap<String, ContainerRecord>>,
    jobs: RwLock<Vec<String>>,
}

pub type Shared = Arc<AppState>;

impl AppState {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            default_ttl: DEFAULT_TEST_TTL,
            stacks: BTreeSet::new(),
            containers: RwLock::new(BTreeMap::new()),
            jobs: RwLock::new(Vec::new()),
        }
    }

    pub fn with_default_ttl(mut self, ttl: u64) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stacks.insert(stack.into());
        self
    }

    pub fn with_container(mut self, name: impl Into<String>, status: impl Into<String>) -> Self {
        self.containers.get_mut().insert(
            name.into(),
            ContainerRecord {
                status: status.into(),
                labels: HashMap::new(),
            },
        );
        self
    }

    /// A container already in test mode whose lease ends at `expires_at`.
    pub fn with_test_container(mut self, name: impl Into<String>, expires_at: u64) -> Self {
        let labels = HashMap::from([
            ("mode".to_string(), "test".to_string()),
            ("expires_at".to_string(), expires_at.to_string()),
        ]);
        self.containers.get_mut().insert(
            name.into(),
            ContainerRecord {
                status: "running".to_string(),
                labels,
            },
        );
        self
    }

    /// Background jobs accepted so far, e.g. `deploy ocr` or
    /// `build ocr:v2 from /srv/stacks/ocr`.
    pub async fn jobs(&self) -> Vec<String> {
        self.jobs.read().await.clone()
    }

    pub async fn container_names(&self) -> Vec<String> {
        self.containers.read().await.keys().cloned().collect()
    }
}

/// Error body in the `{"detail": ...}` shape the infra API uses.
#[derive(Debug)]
pub struct ApiFailure(StatusCode, String);

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "detail": self.1 }))).into_response()
    }
}

fn not_found(name: &str) -> ApiFailure {
    ApiFailure(StatusCode::NOT_FOUND, format!("No such container: {name}"))
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub fn app(token: &str) -> Router {
    router(Arc::new(AppState::new(token)))
}

pub fn router(state: Shared) -> Router {
    let protected = Router::new()
        .route("/containers", get(list_containers))
        .route("/containers/{name}", delete(delete_container))
        .route("/containers/{name}/start", post(start_container))
        .route("/containers/{name}/stop", post(stop_container))
        .route("/containers/{name}/test", post(test_container))
        .route("/build", post(build))
        .route("/deploy", post(deploy))
        .route("/rollback", post(rollback))
        .route("/cleanup/tests", post(cleanup_tests))
        .route("/metrics", get(metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health))
        .route("/debug/echo", any(echo))
        .route("/debug/text", get(|| async { "plain text" }))
        .route("/debug/empty", get(|| async { StatusCode::OK }))
        .route(
            "/debug/fail",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
        )
        .merge(protected)
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: Shared) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

async fn require_bearer(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.token);
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(expected.as_str()) {
        tracing::debug!(uri = %request.uri(), "rejecting unauthenticated request");
        return ApiFailure(StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response();
    }
    next.run(request).await
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_containers(State(state): State<Shared>) -> Json<Vec<Container>> {
    let containers = state.containers.read().await;
    Json(
        containers
            .iter()
            .map(|(name, record)| Container {
                name: name.clone(),
                status: record.status.clone(),
            })
            .collect(),
    )
}

async fn set_status(
    state: &AppState,
    name: &str,
    status: &str,
) -> Result<Json<Value>, ApiFailure> {
    let mut containers = state.containers.write().await;
    let record = containers.get_mut(name).ok_or_else(|| not_found(name))?;
    record.status = status.to_string();
    tracing::info!(container = name, status, "container status changed");
    Ok(Json(json!({ "ok": true })))
}

async fn start_container(
    State(state): State<Shared>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    set_status(&state, &name, "running").await
}

async fn stop_container(
    State(state): State<Shared>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    set_status(&state, &name, "exited").await
}

async fn delete_container(
    State(state): State<Shared>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    state
        .containers
        .write()
        .await
        .remove(&name)
        .ok_or_else(|| not_found(&name))?;
    tracing::info!(container = %name, "container removed");
    Ok(Json(json!({ "ok": true })))
}

async fn test_container(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Query(params): Query<TestParams>,
) -> Result<Json<Value>, ApiFailure> {
    let ttl = params.ttl.unwrap_or(state.default_ttl);
    let expires_at = now().checked_add(ttl).ok_or_else(|| {
        ApiFailure(StatusCode::UNPROCESSABLE_ENTITY, "ttl out of range".to_string())
    })?;
    let lease = expires_at.to_string();
    {
        let mut containers = state.containers.write().await;
        let record = containers.get_mut(&name).ok_or_else(|| not_found(&name))?;
        record.status = "running".to_string();
        record.labels.insert("mode".to_string(), "test".to_string());
        record.labels.insert("expires_at".to_string(), lease.clone());
    }

    let reaper = state.clone();
    let reaped = name.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(ttl)).await;
        let mut containers = reaper.containers.write().await;
        // A newer lease on the same container owns its own timer.
        let current = containers.get(&reaped).is_some_and(|record| {
            record.labels.get("mode").map(String::as_str) == Some("test")
                && record.labels.get("expires_at") == Some(&lease)
        });
        if current {
            containers.remove(&reaped);
            tracing::info!(container = %reaped, "test lease expired");
        }
    });

    Ok(Json(json!({ "expires_at": expires_at })))
}

fn check_stack(state: &AppState, stack: &str) -> Result<(), ApiFailure> {
    if state.stacks.contains(stack) {
        Ok(())
    } else {
        Err(ApiFailure(StatusCode::BAD_REQUEST, "Invalid stack".to_string()))
    }
}

async fn build(State(state): State<Shared>, Json(req): Json<BuildReq>) -> Json<Value> {
    state.jobs.write().await.push(format!("build {} from {}", req.tag, req.path));
    Json(json!({ "status": "build queued" }))
}

async fn deploy(
    State(state): State<Shared>,
    Json(req): Json<DeployReq>,
) -> Result<Json<Value>, ApiFailure> {
    check_stack(&state, &req.stack)?;
    state.jobs.write().await.push(format!("deploy {}", req.stack));
    Ok(Json(json!({ "status": "deploy queued" })))
}

async fn rollback(
    State(state): State<Shared>,
    Json(req): Json<RollbackReq>,
) -> Result<Json<Value>, ApiFailure> {
    check_stack(&state, &req.stack)?;
    state
        .jobs
        .write()
        .await
        .push(format!("rollback {} to {}", req.stack, req.tag));
    Ok(Json(json!({ "ok": true })))
}

async fn cleanup_tests(State(state): State<Shared>) -> Json<Value> {
    let now = now();
    let mut containers = state.containers.write().await;
    let expired: Vec<String> = containers
        .iter()
        .filter(|(_, record)| record.labels.get("mode").map(String::as_str) == Some("test"))
        .filter(|(_, record)| {
            record
                .labels
                .get("expires_at")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
                < now
        })
        .map(|(name, _)| name.clone())
        .collect();
    for name in &expired {
        containers.remove(name);
    }
    Json(json!({ "removed": expired }))
}

async fn metrics(State(state): State<Shared>) -> Json<Value> {
    let running = state
        .containers
        .read()
        .await
        .values()
        .filter(|record| record.status == "running")
        .count();
    Json(json!({
        "cpu": 12.5,
        "ram": 40.0,
        "disk": 63.2,
        "containers": running,
    }))
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    Json(json!({
        "method": method.as_str(),
        "headers": headers,
        "body": body,
    }))
}
