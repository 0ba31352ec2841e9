use moneta::bridge::ToolBridge;
use moneta::retrieval::VectorStore;
use std::sync::Arc;

/// Shared application state.
///
/// The bridge and the retrieval store are process-wide, constructed once in
/// `main` and injected here; the model client itself is built per request
/// from the caller's credential.
#[derive(Clone)]
pub struct AppState {
    pub provider_host: String,
    pub default_model: String,
    pub allowed_models: Vec<String>,
    pub bridge: Arc<ToolBridge>,
    pub store: Arc<dyn VectorStore>,
    pub max_tool_turns: Option<usize>,
}
