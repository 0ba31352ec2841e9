use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

async fn handler() -> Json<Value> {
    Json(json!({
        "status": "running",
        "engine": "moneta",
        "bridge_mode": "http-bridge",
    }))
}

pub fn routes() -> Router {
    Router::new().route("/", get(handler))
}
