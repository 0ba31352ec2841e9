use anyhow::Result;
use async_trait::async_trait;

use crate::models::content::Content;
use crate::models::part::Part;
use crate::models::tool::{FunctionCall, Tool};

/// Everything needed to open a model session for one request.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub system_instruction: String,
    pub tools: Vec<Tool>,
    pub history: Vec<Content>,
}

/// What the model did with the last exchange, decoded once per response.
///
/// Only the first part of the first candidate is ever considered; anything
/// beyond that is dropped. A response carrying neither text nor a function
/// call decodes to `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    Text(String),
    FunctionCall(FunctionCall),
    Empty,
}

/// Base trait for chat model backends.
pub trait ChatProvider: Send + Sync {
    /// Open a stateful session carrying tools, instruction and prior history.
    fn create_session(&self, config: SessionConfig) -> Box<dyn ChatSession>;
}

/// One model conversation. `send` blocks the calling task but nothing else;
/// the session accumulates history across sends within a single request.
#[async_trait]
pub trait ChatSession: Send {
    async fn send(&mut self, input: Vec<Part>) -> Result<ModelTurn>;
}

/// Text embedding backend used for retrieval augmentation.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
