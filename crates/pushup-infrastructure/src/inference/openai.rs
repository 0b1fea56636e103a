//! OpenAI-compatible chat completions client
//!
//! Works against any endpoint exposing `POST {base}/chat/completions`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pushup_domain::inference::{CommentContext, InferenceClient};
use pushup_domain::DomainError;

use crate::config::TimeoutConfig;
use crate::utils::preview;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 100;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionResponseMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeouts.http_request)
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        context: CommentContext,
    ) -> Result<String, DomainError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: [
                CompletionMessage {
                    role: "system",
                    content: context.system_prompt(),
                },
                CompletionMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(context = context.as_str(), model = %self.model, "Requesting completion");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::Inference(format!("Completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = preview(&body, 200), "Completion endpoint rejected request");
            return Err(DomainError::Inference(format!(
                "Completion endpoint returned {status}"
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Inference(format!("Malformed completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| DomainError::Inference("Completion returned no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> OpenAiClient {
        OpenAiClient::new(server.url(), "sk-test", "gpt-3.5-turbo", &TimeoutConfig::new()).unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_context_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 100,
                "messages": [
                    { "role": "system", "content": CommentContext::Report.system_prompt() },
                    { "role": "user", "content": "сколько?" }
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "choices": [ { "message": { "role": "assistant", "content": "  42 \n" } } ] })
                    .to_string(),
            )
            .create_async()
            .await;

        let answer = client_for(&server)
            .complete("сколько?", CommentContext::Report)
            .await
            .unwrap();

        assert_eq!(answer, "42");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_inference_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"bad key"}}"#)
            .create_async()
            .await;

        let result = client_for(&server)
            .complete("x", CommentContext::Personal)
            .await;

        assert!(matches!(result, Err(DomainError::Inference(_))));
    }

    #[tokio::test]
    async fn test_empty_choices_is_inference_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let result = client_for(&server)
            .complete("x", CommentContext::DailyStats)
            .await;

        assert!(matches!(result, Err(DomainError::Inference(_))));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OpenAiClient::new(
            "https://api.example.com/v1/",
            "k",
            "m",
            &TimeoutConfig::new(),
        )
        .unwrap();
        assert_eq!(
            client.completions_url(),
            "https://api.example.com/v1/chat/completions"
        );
    }
}
