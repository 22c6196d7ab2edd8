//! Text-completion capability used by the learned strategies.
//!
//! The pipeline only ever sees the [`Completion`] trait. Production wires in
//! [`CompletionClient`], an OpenAI-compatible chat-completions client; runs
//! without a configured endpoint get [`DisabledCompletion`].

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;

/// Largest `{ ... }` span in a response. Used when the response wraps the
/// object in prose.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON object regex"));

#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    pub system: &'a str,
    pub user: &'a str,
}

/// `complete(prompt) -> text`. Any error trips the calling stage's breaker.
pub trait Completion {
    fn complete(
        &self,
        prompt: &Prompt<'_>,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

/// Stand-in used when no completion endpoint is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCompletion;

impl Completion for DisabledCompletion {
    async fn complete(&self, _prompt: &Prompt<'_>) -> Result<String, CompletionError> {
        Err(CompletionError::Disabled)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `POST {base}/v1/chat/completions` client.
pub struct CompletionClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl CompletionClient {
    /// # Errors
    ///
    /// Returns [`CompletionError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("trendclue/0.1 (trend-signals)")
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.map(str::to_owned),
            model: model.to_owned(),
        })
    }
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Completion for CompletionClient {
    async fn complete(&self, prompt: &Prompt<'_>) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.1,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt.user,
                },
            ],
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::Status(status.as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

/// Run one completion call bounded by `timeout`.
///
/// # Errors
///
/// Returns [`CompletionError::Timeout`] when the deadline passes, otherwise
/// whatever the completion itself returned.
pub async fn complete_within<C: Completion>(
    completion: &C,
    prompt: &Prompt<'_>,
    timeout: Duration,
) -> Result<String, CompletionError> {
    match tokio::time::timeout(timeout, completion.complete(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(CompletionError::Timeout(timeout)),
    }
}

/// Pull a JSON object out of a completion response.
///
/// Tolerates markdown code fences and prose around the object. Anything that
/// is not a JSON object is an error.
///
/// # Errors
///
/// Returns [`CompletionError::Unparseable`] when no JSON object can be found.
pub fn extract_json_object(raw: &str) -> Result<serde_json::Value, CompletionError> {
    let cleaned = strip_code_fences(raw.trim());

    if let Ok(value @ serde_json::Value::Object(_)) =
        serde_json::from_str::<serde_json::Value>(cleaned)
    {
        return Ok(value);
    }

    if let Some(found) = JSON_OBJECT.find(cleaned) {
        if let Ok(value @ serde_json::Value::Object(_)) =
            serde_json::from_str::<serde_json::Value>(found.as_str())
        {
            return Ok(value);
        }
    }

    Err(CompletionError::Unparseable(truncate_for_log(raw)))
}

fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn truncate_for_log(raw: &str) -> String {
    raw.chars().take(120).collect()
}
