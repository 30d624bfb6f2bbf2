//! OpenAI adapter: chat completions with a structured-output schema.

use crate::provider::{base_url, model, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use skiff_core::config::{ProviderConfig, ProviderId};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: Client,
}

impl OpenAiProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// JSON-schema response format pinning the canonical reply shape.
    fn response_format() -> serde_json::Value {
        serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": "assistant_reply",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "markdown": { "type": "string" },
                        "suggestedCommand": { "type": ["string", "null"] }
                    },
                    "required": ["markdown", "suggestedCommand"],
                    "additionalProperties": false
                }
            }
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn complete(
        &self,
        prompt: &str,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", base_url(config, DEFAULT_BASE_URL));
        let body = ChatCompletionRequest {
            model: model(config, DEFAULT_MODEL),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: Self::response_format(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(config.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Network(format!("OpenAI request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            ProviderError::Network(format!("failed to decode OpenAI response: {err}"))
        })?;

        extract_content(parsed)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: serde_json::Value,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_content(response: ChatCompletionResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ProviderError::Empty)
}

fn map_http_error(status: StatusCode, body: String) -> ProviderError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    ProviderError::Http {
        status: status.as_u16(),
        message,
    }
}
