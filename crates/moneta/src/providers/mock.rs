use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::base::{ChatSession, ModelTurn};
use crate::models::part::Part;

/// A scripted session that replays pre-configured turns and records every
/// input it receives, for driving the agent loop in tests.
pub struct MockSession {
    turns: Vec<Result<ModelTurn>>,
    sent: Arc<Mutex<Vec<Vec<Part>>>>,
}

impl MockSession {
    pub fn new(turns: Vec<Result<ModelTurn>>) -> Self {
        Self {
            turns,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the inputs observed so far, usable after the session has
    /// been moved into the loop.
    pub fn sent(&self) -> Arc<Mutex<Vec<Vec<Part>>>> {
        Arc::clone(&self.sent)
    }
}

#[async_trait]
impl ChatSession for MockSession {
    async fn send(&mut self, input: Vec<Part>) -> Result<ModelTurn> {
        self.sent.lock().unwrap().push(input);
        if self.turns.is_empty() {
            Ok(ModelTurn::Empty)
        } else {
            self.turns.remove(0)
        }
    }
}
