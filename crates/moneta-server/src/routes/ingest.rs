use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Form, Json, Router,
};
use chrono::Utc;
use moneta::providers::{base::Embedder, gemini::GeminiProvider};
use serde::{Deserialize, Serialize};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct IngestRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    status: String,
    message: String,
}

/// Persist a knowledge snippet: embed the text and store it under a
/// timestamp-derived id.
async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(request): Form<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("The {} header is required.", API_KEY_HEADER),
            )
        })?;

    let provider = GeminiProvider::new(state.provider_host.clone(), api_key)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let embedding = provider
        .embed(&request.text)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let id = Utc::now().timestamp_millis().to_string();
    state
        .store
        .add(vec![request.text], vec![embedding], vec![id])
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(IngestResponse {
        status: "ok".to_string(),
        message: "Knowledge added to the store.".to_string(),
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/ingest", post(handler))
        .with_state(state)
}
