use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::{self, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use moneta::{
    agent::Agent,
    bridge::ToolInvoker,
    context::{Attachment, ContextAssembler},
    models::{content::Content, role::Role},
    providers::{
        base::{ChatProvider, SessionConfig},
        gemini::GeminiProvider,
    },
};
use serde_json::Value;
use std::{
    convert::Infallible,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const API_KEY_HEADER: &str = "x-api-key";

// Fields of the incoming multipart form
struct ChatForm {
    message: String,
    history: String,
    model_name: Option<String>,
    attachment: Option<Attachment>,
}

/// Chunked plain-text response streaming the reply as it becomes available.
pub struct TextStreamResponse {
    rx: ReceiverStream<String>,
}

impl TextStreamResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for TextStreamResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for TextStreamResponse {
    fn into_response(self) -> axum::response::Response {
        let body = axum::body::Body::from_stream(self);

        http::Response::builder()
            .header("Content-Type", "text/plain; charset=utf-8")
            .header("Cache-Control", "no-cache")
            .body(body)
            .unwrap()
    }
}

async fn read_form(mut multipart: Multipart) -> Result<ChatForm, StatusCode> {
    let mut form = ChatForm {
        message: String::new(),
        history: "[]".to_string(),
        model_name: None,
        attachment: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("message") => {
                form.message = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            }
            Some("history") => {
                form.history = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            }
            Some("model_name") => {
                form.model_name = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            Some("file") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| StatusCode::BAD_REQUEST)?
                    .to_vec();
                form.attachment = Some(Attachment { data, mime_type });
            }
            _ => {}
        }
    }

    Ok(form)
}

// Convert the serialized role/text history into conversation turns.
// A history that fails to parse is treated as empty.
fn convert_history(raw: &str) -> Vec<Content> {
    let Ok(items) = serde_json::from_str::<Vec<Value>>(raw) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| {
            let role = match item.get("role").and_then(|r| r.as_str()) {
                Some("user") => Role::User,
                _ => Role::Model,
            };
            let text = item
                .get("text")
                .and_then(|t| t.as_str())
                .unwrap_or_default();
            Content::text_turn(role, text)
        })
        .collect()
}

async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<TextStreamResponse, (StatusCode, String)> {
    // Reject before any model or tool work begins
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

    let form = read_form(multipart)
        .await
        .map_err(|status| (status, "invalid multipart form".to_string()))?;

    let provider = GeminiProvider::new(state.provider_host.clone(), api_key)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let model = form
        .model_name
        .filter(|name| state.allowed_models.contains(name))
        .unwrap_or_else(|| state.default_model.clone());

    // Tool discovery is fresh per request; failure degrades to no tools.
    let tools = state.bridge.list_tools().await;

    if !form.message.is_empty() {
        tracing::info!("user message: {}", form.message);
    }

    let assembler = ContextAssembler::new(&provider, state.store.as_ref());
    let assembled = assembler
        .assemble(&form.message, form.attachment.as_ref())
        .await;

    let session = provider.create_session(SessionConfig {
        model,
        system_instruction: assembled.system_instruction,
        tools,
        history: convert_history(&form.history),
    });

    let mut agent = Agent::new(state.bridge.clone() as Arc<dyn ToolInvoker>);
    if let Some(limit) = state.max_tool_turns {
        agent = agent.with_max_tool_turns(limit);
    }

    let (tx, rx) = mpsc::channel(100);

    tokio::spawn(async move {
        let mut stream = agent.reply(session, assembled.parts);
        while let Some(chunk) = stream.next().await {
            if tx.send(chunk).await.is_err() {
                // Client disconnected; stop driving the loop.
                break;
            }
        }
    });

    Ok(TextStreamResponse::new(ReceiverStream::new(rx)))
}

pub fn routes(state: AppState) -> Router {
    Router::new().route("/chat", post(handler)).with_state(state)
}
