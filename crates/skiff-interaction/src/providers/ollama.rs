//! Ollama adapter: native generate endpoint against a locally-hosted
//! model server.
//!
//! Anonymous by design: no API key is required. Local models do not
//! reliably honor structured-output instructions, so this adapter reports
//! [`ResponseMode::FreeForm`] and its replies go through the fallback
//! normalizer.

use crate::provider::{base_url, model, ProviderAdapter, ProviderError, ResponseMode};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use skiff_core::config::{ProviderConfig, ProviderId};

const DEFAULT_MODEL: &str = "llama3";
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaProvider {
    client: Client,
}

impl OllamaProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderAdapter for OllamaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    fn response_mode(&self) -> ResponseMode {
        ResponseMode::FreeForm
    }

    async fn complete(
        &self,
        prompt: &str,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", base_url(config, DEFAULT_BASE_URL));
        let body = GenerateRequest {
            model: model(config, DEFAULT_MODEL),
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Network(format!("Ollama request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Ollama error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|err| {
            ProviderError::Network(format!("failed to decode Ollama response: {err}"))
        })?;

        parsed
            .response
            .filter(|text| !text.trim().is_empty())
            .ok_or(ProviderError::Empty)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

fn map_http_error(status: StatusCode, body: String) -> ProviderError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error)
        .unwrap_or(body);
    ProviderError::Http {
        status: status.as_u16(),
        message,
    }
}
