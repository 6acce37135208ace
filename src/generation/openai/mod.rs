
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::Generator;
use crate::DocumindError;
use crate::http::{RetryPolicy, agent_with_timeout, request_with_retry};

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Settings for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// API root, e.g. `https://api.groq.com/openai/v1`
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Key stored in the config file; takes precedence over `api_key_env`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for GenerationConfig {
    #[inline]
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            api_key_env: "GROQ_API_KEY".to_string(),
            api_key: None,
            timeout_seconds: 60,
        }
    }
}

/// Blocking client for `POST {base_url}/chat/completions`
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    agent: ureq::Agent,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// The API key from the config file, else from the configured environment variable
#[inline]
pub fn resolve_api_key(config: &GenerationConfig) -> crate::Result<String> {
    resolve_api_key_with(config, |name| std::env::var(name).ok())
}

/// Like [`resolve_api_key`], reading the environment through `lookup`
#[inline]
pub fn resolve_api_key_with<F>(config: &GenerationConfig, lookup: F) -> crate::Result<String>
where
    F: FnOnce(&str) -> Option<String>,
{
    if let Some(key) = config.api_key.as_deref() {
        if !key.trim().is_empty() {
            return Ok(key.trim().to_string());
        }
    }

    lookup(&config.api_key_env)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            DocumindError::ConfigurationMissing(format!(
                "{} not found in environment variables",
                config.api_key_env
            ))
        })
}

impl ChatClient {
    /// Build a client, failing with `ConfigurationMissing` when no API key is available
    #[inline]
    pub fn new(config: &GenerationConfig) -> crate::Result<Self> {
        let api_key = resolve_api_key(config)?;
        Ok(Self::with_api_key(config, api_key))
    }

    #[inline]
    pub fn with_api_key(config: &GenerationConfig, api_key: String) -> Self {
        Self {
            endpoint: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                CHAT_COMPLETIONS_PATH
            ),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            agent: agent_with_timeout(Duration::from_secs(config.timeout_seconds)),
            retry: RetryPolicy::default(),
        }
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry.attempts = attempts;
        self
    }

    /// Base delay between retries; doubles after each failed attempt
    #[inline]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry.backoff = backoff;
        self
    }

    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `prompt` as a single user message and return the first choice's text
    #[inline]
    pub fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;
        let authorization = format!("Bearer {}", self.api_key);

        debug!("Requesting completion from {} with model {}", self.endpoint, self.model);

        let response_text = request_with_retry(&self.endpoint, self.retry, || {
            self.agent
                .post(self.endpoint.as_str())
                .header("Content-Type", "application/json")
                .header("Authorization", authorization.as_str())
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Chat completion request failed")?;

        let response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .context("No choices in chat response")?
            .message
            .content
            .filter(|content| !content.is_empty())
            .context("Chat response contained no text")?;

        debug!("Received {} chars from {}", content.chars().count(), self.model);
        Ok(content)
    }
}

#[async_trait]
impl Generator for ChatClient {
    #[inline]
    async fn generate(&self, prompt: &str) -> crate::Result<String> {
        let client = self.clone();
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || client.complete(&prompt))
            .await
            .map_err(|e| DocumindError::GenerationFailed(e.to_string()))?
            .map_err(|e| DocumindError::GenerationFailed(format!("{:#}", e)))
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}
