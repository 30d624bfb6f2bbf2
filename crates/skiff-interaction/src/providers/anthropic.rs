//! Anthropic adapter: native messages endpoint.
//!
//! The messages API has no response-schema parameter; the JSON contract is
//! pinned by a system prompt instead. Hosted Claude models follow it
//! reliably enough that replies are still parsed directly.

use crate::provider::{base_url, model, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use skiff_core::config::{ProviderConfig, ProviderId};

const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

const SYSTEM_PROMPT: &str = "Reply with a single JSON object and nothing else: \
no prose before or after it, no code fences.";

pub struct AnthropicProvider {
    client: Client,
}

impl AnthropicProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn complete(
        &self,
        prompt: &str,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/messages", base_url(config, DEFAULT_BASE_URL));
        let body = CreateMessageRequest {
            model: model(config, DEFAULT_MODEL),
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(url)
            .header("x-api-key", config.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Network(format!("Anthropic request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Anthropic error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: CreateMessageResponse = response.json().await.map_err(|err| {
            ProviderError::Network(format!("failed to decode Anthropic response: {err}"))
        })?;

        extract_text(parsed)
    }
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'static str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text(response: CreateMessageResponse) -> Result<String, ProviderError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
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
