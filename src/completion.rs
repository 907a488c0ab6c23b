//! Chat-completion client: send a question plus report context, get an answer.
//!
//! This module is intentionally thin. All prompt text lives in
//! [`crate::prompts`]; here we only build the request, make exactly one HTTP
//! call and classify the outcome. There is no retry, no streaming, and no
//! timeout beyond the transport default.

use crate::config::AssistantConfig;
use crate::error::{AssistantError, CompletionError};
use crate::prompts::{user_message, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, warn};

/// Detail reported when an error response carries no `error.message`.
const NO_ERROR_DETAIL: &str = "No specific error message.";

/// Anything that can answer a question given a report context.
///
/// The controller only sees this trait, so tests can substitute a scripted
/// client for the HTTP one.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Answer `question` using `context` as background.
    async fn complete(&self, question: &str, context: &str) -> Result<String, CompletionError>;
}

/// [`CompletionClient`] backed by an OpenRouter-compatible endpoint.
pub struct OpenRouterClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    system_prompt: String,
}

impl fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    /// Build a client from the assistant configuration.
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AssistantError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        })
    }

    /// The JSON body sent for one question.
    ///
    /// Two messages, in order: the system instruction, then the templated
    /// user message embedding the context and the question.
    pub fn request_body(&self, question: &str, context: &str) -> Value {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": user_message(context, question) },
            ],
        })
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, question: &str, context: &str) -> Result<String, CompletionError> {
        let body = self.request_body(question, context);

        debug!(
            "Completion request to {} (model {}, {} context chars)",
            self.endpoint,
            self.model,
            context.len()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Unexpected(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Unexpected(e.to_string()))?;

        let result = interpret_response(status, &text);
        if let Err(ref e) = result {
            warn!("Completion failed: {}", e);
        }
        result
    }
}

/// Classify a raw HTTP response.
///
/// * 2xx → `choices[0].message.content`, verbatim.
/// * non-2xx → [`CompletionError::Http`] with the status and `error.message`
///   when the body has one.
/// * 2xx with a body that is not JSON or lacks the content field →
///   [`CompletionError::Unexpected`].
pub fn interpret_response(status: u16, body: &str) -> Result<String, CompletionError> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| NO_ERROR_DETAIL.to_string());
        return Err(CompletionError::Http { status, detail });
    }

    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| CompletionError::Unexpected(format!("malformed response JSON: {e}")))?;

    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            CompletionError::Unexpected("missing choices[0].message.content".to_string())
        })
}
