//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Conversion into application and domain types happens here too, so the
//! rest of the program never sees raw strings like `kind = "openai"`.

use roundtable_application::{DeliberationParams, RetryPolicy, SynthesisParams};
use roundtable_domain::{DEFAULT_CONTEXT_WINDOW, ProviderKind, ProviderProfile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("providers.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("deliberation.context_window cannot be 0")]
    InvalidContextWindow,

    #[error("synthesis.temperature must be between 0.0 and 1.0, got {0}")]
    InvalidTemperature(f32),

    #[error("retry.base_delay_ms ({base}) exceeds retry.max_delay_ms ({max})")]
    InvalidBackoff { base: u64, max: u64 },

    #[error("unknown provider kind '{0}' (expected openai, anthropic, perplexity or custom)")]
    UnknownProviderKind(String),

    #[error("no API key for the default provider: set {env} or providers.default.api_key")]
    MissingApiKey { env: String },

    #[error("invalid default provider: {0}")]
    InvalidProvider(String),
}

/// Location of the record store (`[store]` section)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileStoreConfig {
    /// JSON record store file
    pub path: PathBuf,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("roundtable.json"),
        }
    }
}

/// Round loop settings (`[deliberation]` section)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileDeliberationConfig {
    /// Most recent turns included in each prompt
    pub context_window: usize,
    /// Consecutive empty rounds tolerated before stopping; 0 never stops
    pub empty_round_limit: u32,
    /// Call every agent of a round at once
    pub concurrent_turns: bool,
}

impl Default for FileDeliberationConfig {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            empty_round_limit: 2,
            concurrent_turns: false,
        }
    }
}

/// Provider call retry settings (`[retry]` section)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl FileRetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// The profile used by agents without a provider reference, and for synthesis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileProviderProfileConfig {
    /// "openai", "anthropic", "perplexity" or "custom"
    pub kind: String,
    /// Environment variable holding the API key (default depends on `kind`)
    pub api_key_env: Option<String>,
    /// Direct API key (not recommended, use the env var instead)
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

impl Default for FileProviderProfileConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::OpenAi.as_str().to_string(),
            api_key_env: None,
            api_key: None,
            endpoint: None,
            model: None,
        }
    }
}

impl FileProviderProfileConfig {
    pub fn parse_kind(&self) -> Result<ProviderKind, ConfigValidationError> {
        self.kind
            .parse()
            .map_err(|_| ConfigValidationError::UnknownProviderKind(self.kind.clone()))
    }

    /// Environment variable consulted for the API key.
    pub fn key_env(&self, kind: ProviderKind) -> String {
        self.api_key_env.clone().unwrap_or_else(|| {
            match kind {
                ProviderKind::OpenAi => "OPENAI_API_KEY",
                ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
                ProviderKind::Perplexity => "PERPLEXITY_API_KEY",
                ProviderKind::Custom => "ROUNDTABLE_API_KEY",
            }
            .to_string()
        })
    }

    /// Build the profile, reading the API key from the process environment
    /// when it is not configured inline.
    pub fn to_profile(&self) -> Result<ProviderProfile, ConfigValidationError> {
        self.to_profile_with(|name| std::env::var(name).ok())
    }

    pub fn to_profile_with(
        &self,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderProfile, ConfigValidationError> {
        let kind = self.parse_kind()?;
        let env = self.key_env(kind);
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| lookup_env(&env).filter(|key| !key.is_empty()))
            .ok_or(ConfigValidationError::MissingApiKey { env })?;

        let mut profile = ProviderProfile::new(kind, api_key);
        if let Some(endpoint) = &self.endpoint {
            profile = profile.with_endpoint(endpoint.clone());
        }
        if let Some(model) = &self.model {
            profile = profile.with_model(model.clone());
        }
        profile
            .validate()
            .map_err(|e| ConfigValidationError::InvalidProvider(e.to_string()))?;
        Ok(profile)
    }
}

/// Provider settings (`[providers]` section)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Per-attempt timeout for provider calls
    pub timeout_seconds: u64,
    /// Token cap sent to backends that require one when the agent sets none
    pub default_max_tokens: u32,
    pub default: FileProviderProfileConfig,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            default_max_tokens: 4096,
            default: FileProviderProfileConfig::default(),
        }
    }
}

/// Synthesis call settings (`[synthesis]` section)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileSynthesisConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for FileSynthesisConfig {
    fn default() -> Self {
        let params = SynthesisParams::default();
        Self {
            temperature: params.temperature,
            max_tokens: params.max_tokens.unwrap_or(1024),
        }
    }
}

/// Log destinations (`[logging]` section)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for the daily rolling diagnostic log
    pub dir: Option<PathBuf>,
    /// JSONL file receiving structured deliberation events
    pub conversation_log: Option<PathBuf>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub store: FileStoreConfig,
    pub deliberation: FileDeliberationConfig,
    pub retry: FileRetryConfig,
    pub providers: FileProvidersConfig,
    pub synthesis: FileSynthesisConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Check value ranges. The API key is resolved separately so that
    /// commands which never call a provider still work without one.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.providers.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.deliberation.context_window == 0 {
            return Err(ConfigValidationError::InvalidContextWindow);
        }
        if !(0.0..=1.0).contains(&self.synthesis.temperature) {
            return Err(ConfigValidationError::InvalidTemperature(
                self.synthesis.temperature,
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigValidationError::InvalidBackoff {
                base: self.retry.base_delay_ms,
                max: self.retry.max_delay_ms,
            });
        }
        self.providers.default.parse_kind()?;
        Ok(())
    }

    pub fn deliberation_params(&self) -> DeliberationParams {
        let empty_round_limit = match self.deliberation.empty_round_limit {
            0 => None,
            limit => Some(limit),
        };

        DeliberationParams::default()
            .with_context_window(self.deliberation.context_window)
            .with_empty_round_limit(empty_round_limit)
            .with_concurrent_turns(self.deliberation.concurrent_turns)
            .with_call_timeout(Duration::from_secs(self.providers.timeout_seconds))
            .with_retry(self.retry.to_policy())
            .with_synthesis(SynthesisParams {
                temperature: self.synthesis.temperature,
                max_tokens: Some(self.synthesis.max_tokens),
            })
    }
}
