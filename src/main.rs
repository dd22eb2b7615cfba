use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use vibcheck::api;
use vibcheck::config::Config;
use vibcheck::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    if config.tavily.api_key.is_none() {
        tracing::warn!("TAVILY_API_KEY not set; web evidence will be unavailable");
    }
    if config.github.token.is_none() {
        tracing::warn!("GITHUB_TOKEN not set; GitHub search will be rate-limited");
    }

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/api/analyze", post(api::analyze::analyze))
        .route("/health", get(|| async { "ok" }))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
