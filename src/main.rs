use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relay_chat::config::Config;
use relay_chat::routes;
use relay_chat::services::generator::GeminiClient;
use relay_chat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("relay_chat=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("reading configuration")?;
    if config.gemini.api_key.is_none() {
        warn!("API_KEY is not set; every /send-message will fail with 500");
    }

    let generator = GeminiClient::new(config.gemini.clone()).context("building Gemini client")?;
    let state = Arc::new(AppState::new(Arc::new(generator)));

    let app = routes::create_router(&config.static_dir).with_state(state);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(model = %config.gemini.model, "relay chat running at http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
