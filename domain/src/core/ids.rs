//! Identifiers for the records the deliberation core reads and writes.
//!
//! Identifiers are minted by the surrounding administrative layer; the core
//! only carries them around. They serialize as plain strings.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a deliberation session record.
    SessionId
);

string_id!(
    /// Identifier of a configured agent (LLM persona).
    AgentId
);

string_id!(
    /// Identifier of a stored provider profile.
    ProviderId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = SessionId::new("sess-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""sess-1""#);

        let back: AgentId = serde_json::from_str(r#""agent-7""#).unwrap();
        assert_eq!(back, AgentId::from("agent-7"));
        assert_eq!(back.to_string(), "agent-7");
    }
}
