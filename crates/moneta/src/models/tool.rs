use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the model may call, in function-declaration shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema of the arguments the tool accepts
    pub parameters: Value,
}

impl Tool {
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution
    #[serde(default)]
    pub args: Value,
}

impl FunctionCall {
    pub fn new<S: Into<String>>(name: S, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}
