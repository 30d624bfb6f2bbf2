//! Groq adapter: OpenAI-compatible chat completions in JSON-object mode.

use crate::provider::{base_url, model, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use skiff_core::config::{ProviderConfig, ProviderId};

const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqProvider {
    client: Client,
}

impl GroqProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderAdapter for GroqProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Groq
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
            // Groq enforces JSON-object output; the schema itself is pinned
            // by the prompt's response contract.
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(config.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Network(format!("Groq request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Groq error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            ProviderError::Network(format!("failed to decode Groq response: {err}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ProviderError::Empty)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
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

fn map_http_error(status: StatusCode, body: String) -> ProviderError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    ProviderError::Http {
        status: status.as_u16(),
        message,
    }
}
