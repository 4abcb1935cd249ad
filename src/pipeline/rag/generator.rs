//! External text generation.
//!
//! `LlmGenerate` is the seam the plan synthesizer depends on. The production
//! implementation talks to an OpenAI-compatible chat-completions endpoint
//! (NVIDIA NIM by default) with a blocking client and a hard timeout; callers
//! on the async side run it through `spawn_blocking`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::prompt::ChatMessage;
use super::GenerationError;

/// Non-2xx bodies are cut to this many characters in the error.
const MAX_ERROR_BODY_CHARS: usize = 1200;

/// Request/response text generation. One failed attempt is final; there is
/// no retry.
pub trait LlmGenerate: Send + Sync {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError>;

    /// Model identifier, for logs and health output.
    fn model(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Chat-completions client.
pub struct ChatCompletionsClient {
    config: ChatClientConfig,
}

impl ChatCompletionsClient {
    pub fn new(mut config: ChatClientConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { config }
    }

    pub fn config(&self) -> &ChatClientConfig {
        &self.config
    }

    /// Built per call: the blocking client owns its own runtime and must be
    /// created and dropped off the async executor.
    fn http_client(&self) -> Result<reqwest::blocking::Client, GenerationError> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::HttpClient(e.to_string()))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LlmGenerate for ChatCompletionsClient {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http_client()?
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.config.timeout_secs)
                } else if e.is_connect() {
                    GenerationError::Connection(self.config.base_url.clone())
                } else {
                    GenerationError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;

        extract_answer(parsed)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn extract_answer(parsed: ChatCompletionResponse) -> Result<String, GenerationError> {
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

/// Scripted generators for tests.
#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub struct MockGenerator {
        answer: Option<String>,
        calls: AtomicUsize,
    }

    impl MockGenerator {
        pub fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        /// Every call fails with a timeout.
        pub fn failing() -> Self {
            Self {
                answer: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LlmGenerate for MockGenerator {
        fn generate(&self, _messages: &[ChatMessage]) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone().ok_or(GenerationError::Timeout(60))
        }

        fn model(&self) -> &str {
            "mock"
        }
    }
}
