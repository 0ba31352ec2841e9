use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::tool::FunctionCall;

/// Binary attachment payload, already base64 encoded for the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

/// The result of a tool invocation, echoed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// One content part of a conversation turn.
///
/// Externally tagged so it serializes exactly as the model API expects:
/// `{"text": ...}`, `{"inlineData": {...}}`, `{"functionCall": {...}}`,
/// `{"functionResponse": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(Blob),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

impl Part {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Part::Text(text.into())
    }

    /// Build an inline-data part from raw bytes and a media type.
    pub fn blob<S: Into<String>>(data: &[u8], mime_type: S) -> Self {
        Part::InlineData(Blob {
            mime_type: mime_type.into(),
            data: BASE64.encode(data),
        })
    }

    /// Wrap a tool invocation result so the model sees it as the outcome of
    /// the function call it requested.
    pub fn function_response<N: Into<String>, R: Into<String>>(name: N, result: R) -> Self {
        Part::FunctionResponse(FunctionResponse {
            name: name.into(),
            response: json!({ "result": result.into() }),
        })
    }

    /// Get the text if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_part_wire_shape() {
        let part = Part::text("hello");
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value, json!({"text": "hello"}));
    }

    #[test]
    fn test_blob_part_encodes_base64() {
        let part = Part::blob(b"abc", "image/png");
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(
            value,
            json!({"inlineData": {"mimeType": "image/png", "data": "YWJj"}})
        );
    }

    #[test]
    fn test_function_response_wire_shape() {
        let part = Part::function_response("get_quote", "$190.12");
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(
            value,
            json!({"functionResponse": {"name": "get_quote", "response": {"result": "$190.12"}}})
        );
    }
}
