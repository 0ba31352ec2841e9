use async_stream::stream;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::bridge::ToolInvoker;
use crate::models::part::Part;
use crate::providers::base::{ChatSession, ModelTurn};

/// Drives the conversation loop between the model session and the tool
/// bridge, streaming the final answer to the caller.
///
/// The model and the bridge are treated as mutually untrusted peers: every
/// external failure degrades to a textual signal, so the stream always
/// yields at least one chunk.
pub struct Agent {
    invoker: Arc<dyn ToolInvoker>,
    max_tool_turns: Option<usize>,
}

impl Agent {
    pub fn new(invoker: Arc<dyn ToolInvoker>) -> Self {
        Self {
            invoker,
            max_tool_turns: None,
        }
    }

    /// Cap the number of function-call iterations per reply. Without a cap
    /// a model that keeps requesting tools can loop indefinitely.
    pub fn with_max_tool_turns(mut self, limit: usize) -> Self {
        self.max_tool_turns = Some(limit);
        self
    }

    /// Run the reply loop: send the current input, branch on what the model
    /// returned, invoke tools in between, and yield exactly one terminal
    /// chunk (answer text or diagnostic).
    ///
    /// Tool-call iterations are invisible to the stream consumer; they show
    /// up only in logs. Dropping the stream stops the loop at its next
    /// suspension point.
    pub fn reply(
        &self,
        mut session: Box<dyn ChatSession>,
        initial: Vec<Part>,
    ) -> BoxStream<'static, String> {
        let invoker = Arc::clone(&self.invoker);
        let max_tool_turns = self.max_tool_turns;

        Box::pin(stream! {
            let mut input = initial;
            let mut tool_turns = 0usize;

            loop {
                let turn = match session.send(input).await {
                    Ok(turn) => turn,
                    Err(e) => {
                        tracing::error!("model send failed: {}", e);
                        yield format!("An error occurred: {}", e);
                        break;
                    }
                };

                match turn {
                    ModelTurn::Empty => {
                        tracing::warn!("model returned no usable content");
                        yield "Error: the model returned no content.".to_string();
                        break;
                    }
                    ModelTurn::Text(text) => {
                        tracing::info!("model answered with {} chars", text.len());
                        yield text;
                        break;
                    }
                    ModelTurn::FunctionCall(call) => {
                        tool_turns += 1;
                        if let Some(limit) = max_tool_turns {
                            if tool_turns > limit {
                                tracing::warn!("tool-call limit of {} reached", limit);
                                yield "Error: the tool-call limit was reached without a final answer.".to_string();
                                break;
                            }
                        }

                        tracing::info!(tool = %call.name, "model requested tool call");
                        let result = invoker.call_tool(&call.name, call.args.clone()).await;
                        tracing::debug!(tool = %call.name, "tool result: {}", result);

                        // Success and caught tool errors alike go back to the
                        // model as the function result.
                        input = vec![Part::function_response(&call.name, result)];
                    }
                }
            }
        })
    }
}
