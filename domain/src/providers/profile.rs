//! Provider profile value object.
//!
//! A [`ProviderProfile`] is a capability: it names a backend family, the
//! credentials for it and optionally a model and endpoint. The deliberation
//! core never mutates a profile; it only hands it to the provider client.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Backend families the provider client knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions
    #[serde(alias = "open_ai")]
    OpenAi,
    /// Anthropic messages API
    Anthropic,
    /// Perplexity (OpenAI-shaped chat completions)
    Perplexity,
    /// Any OpenAI-compatible endpoint configured by the user
    Custom,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Perplexity => "perplexity",
            ProviderKind::Custom => "custom",
        }
    }

    /// Whether the backend rejects requests without an explicit token cap.
    pub fn requires_token_cap(&self) -> bool {
        matches!(self, ProviderKind::Anthropic)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open_ai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "perplexity" => Ok(ProviderKind::Perplexity),
            "custom" => Ok(ProviderKind::Custom),
            other => Err(DomainError::InvalidProvider(format!(
                "unknown provider kind '{}'",
                other
            ))),
        }
    }
}

/// Connection profile for one provider backend.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    pub api_key: String,
    /// Full request URL; overrides the default for the kind. Required for
    /// [`ProviderKind::Custom`]
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ProviderProfile {
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            endpoint: None,
            model: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Validate the profile before it is used for a call.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.api_key.trim().is_empty() {
            return Err(DomainError::InvalidProvider(format!(
                "{} profile has an empty API key",
                self.kind
            )));
        }
        if self.kind == ProviderKind::Custom {
            if self.endpoint.as_deref().is_none_or(|e| e.trim().is_empty()) {
                return Err(DomainError::InvalidProvider(
                    "custom provider requires an endpoint".to_string(),
                ));
            }
            if self.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
                return Err(DomainError::InvalidProvider(
                    "custom provider requires a model".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// API keys never show up in logs or panics.
impl std::fmt::Debug for ProviderProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderProfile")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            "anthropic".parse::<ProviderKind>().unwrap(),
            ProviderKind::Anthropic
        );
        assert!("bedrock".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_only_anthropic_requires_token_cap() {
        assert!(ProviderKind::Anthropic.requires_token_cap());
        assert!(!ProviderKind::OpenAi.requires_token_cap());
        assert!(!ProviderKind::Perplexity.requires_token_cap());
        assert!(!ProviderKind::Custom.requires_token_cap());
    }

    #[test]
    fn test_custom_profile_requires_endpoint_and_model() {
        let profile = ProviderProfile::new(ProviderKind::Custom, "key");
        assert!(profile.validate().is_err());

        let profile = profile.with_endpoint("http://localhost:8080/v1/chat/completions");
        assert!(profile.validate().is_err());

        let profile = profile.with_model("llama3");
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let profile = ProviderProfile::new(ProviderKind::OpenAi, "  ");
        assert!(matches!(
            profile.validate(),
            Err(DomainError::InvalidProvider(_))
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let profile = ProviderProfile::new(ProviderKind::OpenAi, "sk-secret");
        let debug = format!("{:?}", profile);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_profile_serializes_kind_as_type() {
        let profile = ProviderProfile::new(ProviderKind::Perplexity, "pplx").with_model("sonar");
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["type"], "perplexity");
        assert_eq!(json["apiKey"], "pplx");
        assert_eq!(json["model"], "sonar");
    }
}
