use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::base::{ChatProvider, ChatSession, Embedder, ModelTurn, SessionConfig};
use crate::models::content::Content;
use crate::models::part::{Blob, Part};
use crate::models::tool::{FunctionCall, Tool};

pub const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
pub const EMBEDDING_MODEL: &str = "text-embedding-004";

const EMBED_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a Gemini-style generateContent/embedContent API.
///
/// Constructed per request with the caller's credential; the chat send
/// inherits the HTTP client's default timeout (no explicit bound), while
/// embedding requests are bounded at 10s.
pub struct GeminiProvider {
    client: Client,
    host: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new<H: Into<String>, K: Into<String>>(host: H, api_key: K) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            host: host.into(),
            api_key: api_key.into(),
        })
    }

    fn model_url(&self, model: &str, action: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.host.trim_end_matches('/'),
            model,
            action
        )
    }
}

impl ChatProvider for GeminiProvider {
    fn create_session(&self, config: SessionConfig) -> Box<dyn ChatSession> {
        Box::new(GeminiSession {
            client: self.client.clone(),
            url: self.model_url(&config.model, "generateContent"),
            api_key: self.api_key.clone(),
            system_instruction: config.system_instruction,
            tools: config.tools,
            contents: config.history,
        })
    }
}

#[async_trait]
impl Embedder for GeminiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let payload = json!({ "content": { "parts": [{ "text": text }] } });
        let response = self
            .client
            .post(self.model_url(EMBEDDING_MODEL, "embedContent"))
            .query(&[("key", self.api_key.as_str())])
            .timeout(EMBED_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let err_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("embedding request failed: {}: {}", status, err_text));
        }

        let body: EmbedResponse = response.json().await?;
        Ok(body.embedding.values)
    }
}

/// One chat conversation against the model API.
///
/// The REST endpoint is stateless, so the session keeps the accumulated
/// contents itself: each send posts history plus the current input and
/// appends the model's reply before decoding it.
pub struct GeminiSession {
    client: Client,
    url: String,
    api_key: String,
    system_instruction: String,
    tools: Vec<Tool>,
    contents: Vec<Content>,
}

#[async_trait]
impl ChatSession for GeminiSession {
    async fn send(&mut self, input: Vec<Part>) -> Result<ModelTurn> {
        self.contents.push(Content::user(input));

        let mut payload = json!({
            "contents": self.contents,
            "systemInstruction": { "parts": [{ "text": self.system_instruction }] },
        });
        if !self.tools.is_empty() {
            payload["tools"] = json!([{ "functionDeclarations": self.tools }]);
        }

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let err_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("model request failed: {}: {}", status, err_text));
        }

        let body: GenerateResponse = response.json().await?;

        let parts = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(RawPart::into_part)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        // Only the first part of the first candidate drives the turn; the
        // rest is kept in history but otherwise dropped.
        let turn = match parts.first() {
            Some(Part::FunctionCall(call)) => ModelTurn::FunctionCall(call.clone()),
            Some(Part::Text(text)) => ModelTurn::Text(text.clone()),
            _ => ModelTurn::Empty,
        };

        if !parts.is_empty() {
            self.contents.push(Content::model(parts));
        }

        Ok(turn)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    #[serde(default)]
    parts: Vec<RawPart>,
}

/// A response part as the wire delivers it: a bag of optional fields, turned
/// into the tagged `Part` union exactly once.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPart {
    text: Option<String>,
    function_call: Option<FunctionCall>,
    inline_data: Option<Blob>,
}

impl RawPart {
    fn into_part(self) -> Option<Part> {
        if let Some(call) = self.function_call {
            Some(Part::FunctionCall(call))
        } else if let Some(text) = self.text {
            Some(Part::Text(text))
        } else {
            self.inline_data.map(Part::InlineData)
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}
