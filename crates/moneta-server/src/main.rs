mod configuration;
mod error;
mod routes;
mod state;

use moneta::bridge::ToolBridge;
use moneta::retrieval::{MemoryStore, VectorStore};
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = configuration::Settings::new()?;

    let bridge = Arc::new(ToolBridge::new(
        settings.bridge.url.clone(),
        settings.bridge.api_key.clone(),
    )?);
    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());

    let state = AppState {
        provider_host: settings.provider.host.clone(),
        default_model: settings.provider.default_model.clone(),
        allowed_models: settings.provider.allowed_models.clone(),
        bridge,
        store,
        max_tool_turns: settings.engine.max_tool_turns,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
