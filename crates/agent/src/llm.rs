use std::time::Duration;

use async_trait::async_trait;
use chowbot_core::config::LlmConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("LLM_API_KEY 未設定")]
    NotConfigured,
    #[error("{0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("invalid generator response: {0}")]
    InvalidResponse(String),
}

/// Text-generation backend. Callers check `is_configured` before optional
/// work such as style rewrites and translations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Stand-in used when no API key is configured; every call short-circuits.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredLlm;

#[async_trait]
impl LlmClient for UnconfiguredLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, GeneratorError> {
        Err(GeneratorError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Ollama-style `POST {base_url}/api/generate` client.
pub struct HttpLlmClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| GeneratorError::Transport(format!("failed to build http client: {error}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key().map(|key| SecretString::from(key.to_string())),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError> {
        let api_key = self.api_key.as_ref().ok_or(GeneratorError::NotConfigured)?;

        debug!(
            event_name = "agent.llm.request",
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "sending generation request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.expose_secret())
            .json(&GenerateRequest { model: &self.model, prompt, stream: false })
            .send()
            .await
            .map_err(|error| {
                warn!(
                    event_name = "agent.llm.request_failed",
                    timeout = error.is_timeout(),
                    "generation request failed"
                );
                GeneratorError::Transport(error.without_url().to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(event_name = "agent.llm.request_rejected", status = %status, "generator rejected request");
            return Err(GeneratorError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| GeneratorError::InvalidResponse(error.to_string()))?;
        Ok(response_text(&body))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// `response` wins; some gateways answer with `text` instead.
fn response_text(body: &Value) -> String {
    ["response", "text"]
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}
