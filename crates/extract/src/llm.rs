use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Failure of the model call itself, before any output exists.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("rate limited by model service")]
    RateLimited { retry_after: Option<Duration> },

    #[error("model service unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can turn a system prompt plus user text into raw model output.
pub trait CompletionSource: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> impl Future<Output = Result<String, UpstreamError>> + Send;
}

/// OpenAI-compatible chat completions client (Groq by default).
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatClient {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            base_url,
            model,
            api_key,
            temperature: 0.2,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        // Builder only fails when the TLS backend cannot initialise; keep the default client then.
        if let Ok(client) = reqwest::Client::builder().timeout(timeout).build() {
            self.client = client;
        }
        self
    }

    pub fn groq(api_key: String) -> Self {
        Self::new(
            "https://api.groq.com/openai/v1".to_string(),
            "llama3-8b-8192".to_string(),
            api_key,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, system_prompt: &str, user_text: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(UpstreamError::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(UpstreamError::Unavailable(format!("status {status}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Unavailable(format!("unreadable response: {}", e.without_url())))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| UpstreamError::Unavailable("response had no message content".to_string()))
    }
}

impl CompletionSource for ChatClient {
    fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> impl Future<Output = Result<String, UpstreamError>> + Send {
        self.generate(system_prompt, user_text)
    }
}

/// `Retry-After` in delta-seconds form; HTTP dates are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
