use std::sync::Arc;

use mock_server::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let token = std::env::var("INFRA_API_TOKEN")
        .map_err(|_| std::io::Error::other("INFRA_API_TOKEN is not set"))?;
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let stacks = std::env::var("STACKS").unwrap_or_default();

    let state = stacks
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .fold(AppState::new(token), |state, stack| state.with_stack(stack));

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    mock_server::run(listener, Arc::new(state)).await
}
