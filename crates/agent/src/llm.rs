use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use navigator_core::config::LlmConfig;

const MAX_TOKENS: u32 = 150;
const RETRY_BACKOFF_MS: u64 = 250;

/// Chat-completion seam used by the intent classifier. Implementations return
/// the assistant's text for a single system + user exchange.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any endpoint speaking the OpenAI chat-completions dialect
/// (OpenAI itself, Ollama's `/v1` bridge).
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiCompatClient {
    /// Builds a client from config, or `None` when the provider is disabled.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        if !config.is_enabled() {
            return Ok(None);
        }
        let base_url = config.effective_base_url();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client for LLM provider")?;

        Ok(Some(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, Attempt> {
        let mut request = self.http.post(self.endpoint()).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            let retryable = is_transient(&error);
            Attempt::new(anyhow!(error).context("LLM request failed"), retryable)
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| Attempt::new(anyhow!(error).context("LLM response unreadable"), true))?;

        if !status.is_success() {
            let retryable = is_retryable_status(status);
            return Err(Attempt::new(
                anyhow!("LLM provider returned {status}: {}", error_message(&text)),
                retryable,
            ));
        }

        parse_completion(&text).map_err(|error| Attempt::new(error, false))
    }
}

struct Attempt {
    error: anyhow::Error,
    retryable: bool,
}

impl Attempt {
    fn new(error: anyhow::Error, retryable: bool) -> Self {
        Self { error, retryable }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(content) => return Ok(content),
                Err(failed) if failed.retryable && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        event_name = "agent.llm.retry",
                        attempt,
                        error = %failed.error,
                        "retrying LLM request"
                    );
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt)))
                        .await;
                }
                Err(failed) => return Err(failed.error),
            }
        }
    }
}

/// Timeouts and refused or dropped connections. Builder, redirect and
/// decode errors fail the same way on every attempt.
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn parse_completion(body: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(body).context("LLM response is not valid JSON")?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| anyhow!("LLM response has no message content"))
}

/// Pulls `error.message` out of a provider error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use navigator_core::config::{AppConfig, LlmConfig, LlmProvider};

    use reqwest::StatusCode;

    use super::{
        error_message, is_retryable_status, is_transient, parse_completion, OpenAiCompatClient,
    };

    #[test]
    fn parses_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"CATEGORY: audio"}}]}"#;
        assert_eq!(parse_completion(body).expect("content"), "CATEGORY: audio");

        assert!(parse_completion(r#"{"choices":[]}"#).is_err());
        assert!(parse_completion("not json").is_err());
    }

    #[test]
    fn extracts_provider_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");
        assert_eq!(error_message("upstream down "), "upstream down");
    }

    #[test]
    fn disabled_provider_builds_no_client() {
        let config = AppConfig::default().llm;
        assert!(OpenAiCompatClient::from_config(&config).expect("config").is_none());

        let config = LlmConfig { provider: LlmProvider::Ollama, ..AppConfig::default().llm };
        let client = OpenAiCompatClient::from_config(&config).expect("config").expect("client");
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(client.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn only_transient_failures_are_retried() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));

        let malformed = reqwest::Client::new().get("not a url").build().expect_err("bad url");
        assert!(malformed.is_builder());
        assert!(!is_transient(&malformed));
    }
}
