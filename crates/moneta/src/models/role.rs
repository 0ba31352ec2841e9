use serde::{Deserialize, Serialize};

/// The speaker of a conversation turn, in the model API's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}
