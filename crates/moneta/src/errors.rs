use thiserror::Error;

/// Failures talking to the tool bridge.
///
/// These never cross the public bridge API: discovery degrades to an empty
/// tool set and invocation degrades to an error string fed back to the model.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("bridge request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("bridge returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed bridge reply: {0}")]
    MalformedReply(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
