use serde::{Deserialize, Serialize};

use super::part::Part;
use super::role::Role;

/// A single conversation turn: a role plus one or more content parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Content {
            role: Role::User,
            parts,
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Content {
            role: Role::Model,
            parts,
        }
    }

    /// Shorthand for a plain text turn, used when decoding caller history.
    pub fn text_turn<S: Into<String>>(role: Role, text: S) -> Self {
        Content {
            role,
            parts: vec![Part::text(text)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_wire_shape() {
        let content = Content::text_turn(Role::User, "hi");
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value, json!({"role": "user", "parts": [{"text": "hi"}]}));
    }
}
