//! LLM Client: the single point of entry for all text-generation calls.
//!
//! ARCHITECTURAL RULE: No other module may call the generation endpoint directly.
//! All LLM interactions MUST go through `TextGenerator`, whose production
//! implementation is `LlmClient`.
//!
//! The client speaks the chat-completions wire format: a system instruction and
//! a user message in, the first choice's message content out.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;
pub mod retry;

use retry::{run_with_retry, RetryPolicy};

/// Hard cap on generated tokens per call. Adapted fields are a few hundred
/// characters at most.
pub const MAX_COMPLETION_TOKENS: u32 = 1024;

/// Model-name fragments of reasoning models, which reject `temperature`.
const REASONING_MODEL_MARKERS: &[&str] = &["o1", "o3", "o4", "gpt-5", "reasoner"];

/// Status codes worth another attempt.
const TRANSIENT_STATUSES: &[u16] = &[429, 500, 502, 503];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM generation is disabled (LLM_ENABLED=false)")]
    Disabled,

    #[error("LLM client is not configured; missing settings: {}", .missing.join(", "))]
    NotConfigured { missing: Vec<&'static str> },

    #[error("LLM request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Timeouts and rate-limit / gateway statuses. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Timeout => true,
            LlmError::Api { status, .. } => TRANSIENT_STATUSES.contains(status),
            _ => false,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::Disabled | LlmError::NotConfigured { .. })
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(e)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Settings for the generation endpoint. Owned by `Config`; checked on first use.
#[derive(Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: f32,
    pub timeout: Duration,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("enabled", &self.enabled)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Borrowed view of a config that passed validation.
#[derive(Clone, Copy)]
pub struct ResolvedSettings<'a> {
    pub api_base: &'a str,
    pub api_key: &'a str,
    pub model: &'a str,
    pub temperature: f32,
}

impl LlmConfig {
    /// Enabled and holding a credential. An unavailable client turns adaptation
    /// into a passthrough rather than an error.
    pub fn is_available(&self) -> bool {
        self.enabled && non_blank(&self.api_key).is_some()
    }

    /// Checks every required setting, reporting all of the missing ones at once.
    pub fn validate(&self) -> Result<ResolvedSettings<'_>, LlmError> {
        if !self.enabled {
            return Err(LlmError::Disabled);
        }

        let mut missing = Vec::new();
        let api_base = non_blank(&self.api_base);
        let api_key = non_blank(&self.api_key);
        let model = non_blank(&self.model);

        if api_base.is_none() {
            missing.push("LLM_API_BASE");
        }
        if api_key.is_none() {
            missing.push("LLM_API_KEY");
        }
        if model.is_none() {
            missing.push("LLM_MODEL");
        }
        if self.timeout.is_zero() {
            missing.push("LLM_TIMEOUT_SECS");
        }

        match (api_base, api_key, model) {
            (Some(api_base), Some(api_key), Some(model)) if missing.is_empty() => {
                Ok(ResolvedSettings {
                    api_base,
                    api_key,
                    model,
                    temperature: self.temperature,
                })
            }
            _ => Err(LlmError::NotConfigured { missing }),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Reasoning models reject the temperature parameter outright.
pub fn supports_temperature(model: &str) -> bool {
    let model = model.to_lowercase();
    !REASONING_MODEL_MARKERS
        .iter()
        .any(|marker| model.contains(marker))
}

// ────────────────────────────────────────────────────────────────────────────
// Wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn build_request<'a>(
    settings: &ResolvedSettings<'a>,
    system: &'a str,
    user: &'a str,
) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model: settings.model,
        messages: [
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ],
        max_completion_tokens: MAX_COMPLETION_TOKENS,
        temperature: supports_temperature(settings.model).then_some(settings.temperature),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Anything that can turn a system instruction and a user message into text.
///
/// The adaptation pipeline only ever sees this trait, carried as
/// `Arc<dyn TextGenerator>`; tests swap in scripted generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// False when generation is switched off or has no credential.
    fn is_available(&self) -> bool;

    /// Full configuration check, run before any network call is made.
    fn check_configuration(&self) -> Result<(), LlmError> {
        Ok(())
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Chat-completions client with transient-failure retry.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            client,
            config,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One HTTP round trip. Returns the raw content of the first choice.
    async fn send_once(
        &self,
        url: &str,
        api_key: &str,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<String, LlmError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Try to parse error message
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON body: {e}")))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                LlmError::MalformedResponse("response contained no generated choice".to_string())
            })
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    fn is_available(&self) -> bool {
        self.config.is_available()
    }

    fn check_configuration(&self) -> Result<(), LlmError> {
        self.config.validate().map(|_| ())
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let settings = self.config.validate()?;
        let url = format!("{}/chat/completions", settings.api_base.trim_end_matches('/'));
        let body = build_request(&settings, system, user);

        let url = url.as_str();
        let body = &body;
        let raw = run_with_retry(&self.retry, move |_| {
            self.send_once(url, settings.api_key, body)
        })
        .await?;

        Ok(clean_generated_text(&raw))
    }
}

/// Factory used at startup. Tests build their own generators instead of
/// touching any shared instance.
pub fn build_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>, LlmError> {
    Ok(Arc::new(LlmClient::new(config.clone())?))
}

/// Strips code fences and a matching pair of wrapping quotes from model output.
pub fn clean_generated_text(text: &str) -> String {
    let text = strip_code_fences(text.trim());
    strip_wrapping_quotes(text).trim().to_string()
}

/// Strips ```lang ... ``` or ``` ... ``` fences from LLM output.
fn strip_code_fences(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening line.
    let inner = match inner.split_once('\n') {
        Some((tag, rest)) if !tag.trim().contains(' ') => rest,
        _ => inner,
    };
    inner
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(inner)
        .trim()
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}')] {
        if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            if !inner.contains(open) && !inner.contains(close) {
                return inner;
            }
        }
    }
    text
}
