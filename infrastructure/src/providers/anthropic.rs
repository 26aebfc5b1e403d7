//! Anthropic Messages API wire format.
//!
//! The system prompt is a top-level field and `max_tokens` is mandatory.

use roundtable_application::CompletionRequest;
use roundtable_domain::Role;
use serde::{Deserialize, Serialize};

pub(crate) const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    pub messages: Vec<WireMessage<'a>>,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> MessagesRequest<'a> {
    pub fn new(model: &'a str, request: &'a CompletionRequest, default_max_tokens: u32) -> Self {
        // System messages inside the list are not accepted by this API
        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();

        Self {
            model,
            max_tokens: request.max_tokens.unwrap_or(default_max_tokens),
            system: Some(request.system_prompt.as_str()).filter(|s| !s.is_empty()),
            messages,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl MessagesResponse {
    /// Concatenated text blocks, if any carry text.
    pub fn into_text(self) -> Option<String> {
        let text: String = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();
        Some(text).filter(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::Message;

    #[test]
    fn test_token_cap_is_always_sent() {
        let request = CompletionRequest::new("You are terse.", vec![Message::user("Hi")]);

        let body = serde_json::to_value(MessagesRequest::new("claude", &request, 4096)).unwrap();

        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["system"], "You are terse.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);

        let capped = request.with_max_tokens(Some(128));
        let body = serde_json::to_value(MessagesRequest::new("claude", &capped, 4096)).unwrap();
        assert_eq!(body["max_tokens"], 128);
    }

    #[test]
    fn test_text_blocks_are_joined() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"Hello "},{"type":"tool_use","id":"x"},{"type":"text","text":"there"}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), Some("Hello there".to_string()));
    }
}
