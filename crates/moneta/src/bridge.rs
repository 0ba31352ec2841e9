use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::errors::{BridgeError, BridgeResult};
use crate::models::tool::Tool;

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes a single named tool call and reports its outcome as text.
///
/// Implementations never fail: a broken tool degrades the conversation, it
/// does not abort it.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn call_tool(&self, name: &str, arguments: Value) -> String;
}

/// JSON-RPC-over-HTTP client for the external tool bridge.
///
/// The bridge exposes `tools/list` and `tools/call`, authenticated by an
/// `apikey` query parameter, with replies wrapped in a `{"result": ...}`
/// envelope.
pub struct ToolBridge {
    client: Client,
    url: String,
    api_key: String,
}

impl ToolBridge {
    pub fn new<U: Into<String>, K: Into<String>>(url: U, api_key: K) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }

    /// Discover the bridge's current tool catalog as function declarations.
    ///
    /// Discovery failure degrades to "no tools available": any transport
    /// error, non-success status or malformed reply yields an empty vec.
    pub async fn list_tools(&self) -> Vec<Tool> {
        match self.rpc("tools/list", json!({}), DISCOVERY_TIMEOUT).await {
            Ok(result) => {
                let records = result
                    .get("tools")
                    .and_then(|tools| tools.as_array())
                    .cloned()
                    .unwrap_or_default();

                records
                    .iter()
                    .filter_map(|record| {
                        let name = record.get("name")?.as_str()?;
                        let description = record
                            .get("description")
                            .and_then(|d| d.as_str())
                            .unwrap_or_default();
                        let parameters = record
                            .get("inputSchema")
                            .cloned()
                            .unwrap_or_else(|| json!({}));
                        Some(Tool::new(name, description, parameters))
                    })
                    .collect()
            }
            Err(e) => {
                tracing::warn!("tool discovery failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn rpc(&self, rpc_method: &str, params: Value, timeout: Duration) -> BridgeResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": rpc_method,
            "method": rpc_method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .query(&[("apikey", self.api_key.as_str())])
            .timeout(timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status(status));
        }

        let body: Value = response.json().await?;
        body.get("result")
            .cloned()
            .ok_or_else(|| BridgeError::MalformedReply("missing result envelope".to_string()))
    }
}

#[async_trait]
impl ToolInvoker for ToolBridge {
    /// Invoke a tool and extract the textual result from its reply.
    ///
    /// Falls back to serializing the raw result when the expected text field
    /// is absent. Failures become a descriptive error string so the model
    /// can see and react to them.
    async fn call_tool(&self, name: &str, arguments: Value) -> String {
        let params = json!({ "name": name, "arguments": arguments });
        match self.rpc("tools/call", params, CALL_TIMEOUT).await {
            Ok(result) => {
                let text = result
                    .get("content")
                    .and_then(|content| content.as_array())
                    .and_then(|content| content.first())
                    .and_then(|first| first.get("text"))
                    .and_then(|text| text.as_str());

                match text {
                    Some(text) => text.to_string(),
                    None => result.to_string(),
                }
            }
            Err(e) => format!("Error calling tool: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_tools_maps_records() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(query_param("apikey", "bridge-key"))
            .and(body_partial_json(json!({"method": "tools/list"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"tools": [{
                    "name": "get_quote",
                    "description": "Fetch the latest quote for a symbol",
                    "inputSchema": {"type": "object", "properties": {"symbol": {"type": "string"}}}
                }]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let bridge = ToolBridge::new(server.uri(), "bridge-key").unwrap();
        let tools = bridge.list_tools().await;

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "get_quote");
        assert_eq!(tools[0].description, "Fetch the latest quote for a symbol");
        assert_eq!(tools[0].parameters["type"], "object");
    }

    #[tokio::test]
    async fn test_list_tools_unreachable_is_empty_twice() {
        // Nothing listening on this port; both calls must degrade, not raise.
        let bridge = ToolBridge::new("http://127.0.0.1:9", "bridge-key").unwrap();
        assert!(bridge.list_tools().await.is_empty());
        assert!(bridge.list_tools().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_tools_server_error_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let bridge = ToolBridge::new(server.uri(), "bridge-key").unwrap();
        assert!(bridge.list_tools().await.is_empty());
    }

    #[tokio::test]
    async fn test_call_tool_extracts_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "tools/call",
                "params": {"name": "get_quote", "arguments": {"symbol": "AAPL"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"content": [{"type": "text", "text": "$190.12"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let bridge = ToolBridge::new(server.uri(), "bridge-key").unwrap();
        let result = bridge
            .call_tool("get_quote", json!({"symbol": "AAPL"}))
            .await;
        assert_eq!(result, "$190.12");
    }

    #[tokio::test]
    async fn test_call_tool_falls_back_to_raw_result() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"rows": [1, 2, 3]}
            })))
            .mount(&server)
            .await;

        let bridge = ToolBridge::new(server.uri(), "bridge-key").unwrap();
        let result = bridge.call_tool("get_quote", json!({})).await;
        assert_eq!(result, json!({"rows": [1, 2, 3]}).to_string());
    }

    #[tokio::test]
    async fn test_call_tool_failure_becomes_error_string() {
        let bridge = ToolBridge::new("http://127.0.0.1:9", "bridge-key").unwrap();
        let result = bridge.call_tool("get_quote", json!({})).await;
        assert!(result.starts_with("Error calling tool:"));
    }

    #[tokio::test]
    async fn test_call_tool_missing_envelope_becomes_error_string() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&server)
            .await;

        let bridge = ToolBridge::new(server.uri(), "bridge-key").unwrap();
        let result = bridge.call_tool("get_quote", json!({})).await;
        assert!(result.starts_with("Error calling tool:"));
    }
}
