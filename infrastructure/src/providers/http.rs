//! HTTP provider client
//!
//! One [`ProviderClient`] for every supported backend. The profile's kind
//! selects the wire format and the default endpoint and model; callers
//! never branch on it.

use super::anthropic::{ANTHROPIC_VERSION, MessagesRequest, MessagesResponse};
use super::openai_compat::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header::HeaderValue};
use roundtable_application::{CompletionRequest, ProviderClient, ProviderError};
use roundtable_domain::{ProviderKind, ProviderProfile};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const PERPLEXITY_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";

const OPENAI_MODEL: &str = "gpt-4o-mini";
const ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const PERPLEXITY_MODEL: &str = "sonar";

/// Settings shared by every call the client makes.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub timeout: Duration,
    /// Sent to backends that require a token cap when the request has none
    pub default_max_tokens: u32,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            default_max_tokens: 4096,
        }
    }
}

pub struct HttpProviderClient {
    client: Client,
    config: HttpProviderConfig,
}

impl HttpProviderClient {
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(profile: &ProviderProfile) -> Result<&str, ProviderError> {
        if let Some(endpoint) = profile.endpoint.as_deref() {
            return Ok(endpoint);
        }
        match profile.kind {
            ProviderKind::OpenAi => Ok(OPENAI_ENDPOINT),
            ProviderKind::Anthropic => Ok(ANTHROPIC_ENDPOINT),
            ProviderKind::Perplexity => Ok(PERPLEXITY_ENDPOINT),
            ProviderKind::Custom => Err(ProviderError::InvalidProfile(
                "custom provider requires an endpoint".into(),
            )),
        }
    }

    fn model(profile: &ProviderProfile) -> Result<&str, ProviderError> {
        if let Some(model) = profile.model.as_deref() {
            return Ok(model);
        }
        match profile.kind {
            ProviderKind::OpenAi => Ok(OPENAI_MODEL),
            ProviderKind::Anthropic => Ok(ANTHROPIC_MODEL),
            ProviderKind::Perplexity => Ok(PERPLEXITY_MODEL),
            ProviderKind::Custom => Err(ProviderError::InvalidProfile(
                "custom provider requires a model".into(),
            )),
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ProviderError> {
        let response = builder.send().await.map_err(|err| self.map_send_error(err))?;
        let response = check_status(response).await?;
        response.json::<T>().await.map_err(|err| {
            if err.is_timeout() {
                ProviderError::Timeout(self.config.timeout)
            } else {
                ProviderError::MalformedResponse(format!("Failed to parse response: {err}"))
            }
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.config.timeout)
        } else {
            ProviderError::Transport(format!("Request failed: {err}"))
        }
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn complete(
        &self,
        profile: &ProviderProfile,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        profile
            .validate()
            .map_err(|e| ProviderError::InvalidProfile(e.to_string()))?;
        let endpoint = Self::endpoint(profile)?;
        let model = Self::model(profile)?;
        debug!("POST {} ({}, model {})", endpoint, profile.kind, model);

        let text = match profile.kind {
            ProviderKind::Anthropic => {
                let body = MessagesRequest::new(model, request, self.config.default_max_tokens);
                let builder = self
                    .client
                    .post(endpoint)
                    .header("x-api-key", &profile.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body);
                self.send::<MessagesResponse>(builder).await?.into_text()
            }
            ProviderKind::OpenAi | ProviderKind::Perplexity | ProviderKind::Custom => {
                let body = ChatRequest::new(model, request);
                let builder = self
                    .client
                    .post(endpoint)
                    .bearer_auth(&profile.api_key)
                    .json(&body);
                self.send::<ChatResponse>(builder).await?.into_text()
            }
        };

        text.ok_or_else(|| {
            ProviderError::MalformedResponse(format!("{} returned no text", profile.kind))
        })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = parse_retry_after(response.headers().get("retry-after"));
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(map_http_error(status, body, retry_after))
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> ProviderError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(message),
        StatusCode::PAYMENT_REQUIRED => ProviderError::PaymentRequired(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after },
        StatusCode::REQUEST_TIMEOUT => ProviderError::Server {
            status: status.as_u16(),
            message,
        },
        s if s.is_server_error() => ProviderError::Server {
            status: s.as_u16(),
            message,
        },
        s => ProviderError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
