//! LLM client: the single point of entry for all chat-completion calls.
//!
//! No other module may call the LLM API directly. The endpoint is any
//! OpenAI-compatible `/chat/completions` (DeepSeek by default); base URL and
//! model come from configuration.
//!
//! Calls are made once. A failure is returned to the caller as-is.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if it has any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Pulls the provider's message out of an error body, falling back to the raw body.
fn error_message(body: String) -> String {
    serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// One system + user exchange, returning the full response object.
    pub async fn call(&self, system: &str, prompt: &str) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {status}: {body}");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_message(body),
            });
        }

        let body = response.text().await?;
        let chat: ChatResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(chat)
    }

    /// Calls the LLM and returns the text of the first choice.
    pub async fn call_text(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(system, prompt).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> LlmClient {
        LlmClient::new("key".into(), base_url.into(), "deepseek-chat".into()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        assert_eq!(
            client("https://api.deepseek.com").endpoint(),
            "https://api.deepseek.com/chat/completions"
        );
        assert_eq!(
            client("http://localhost:8000/v1/").endpoint(),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn test_response_text_takes_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{
                "choices": [
                    {"message": {"role": "assistant", "content": "Sparkling clean."}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
            }"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("Sparkling clean."));
    }

    #[test]
    fn test_response_text_empty_when_no_content() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "  "}}]}"#).unwrap();
        assert_eq!(response.text(), None);

        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_error_message_prefers_provider_message() {
        assert_eq!(
            error_message(r#"{"error": {"message": "Authentication Fails", "type": "auth"}}"#.into()),
            "Authentication Fails"
        );
        assert_eq!(error_message("Bad Gateway".into()), "Bad Gateway");
    }
}
