//! Gemini adapter: native generateContent endpoint, key in the query
//! string, JSON output requested through generationConfig.

use crate::provider::{base_url, model, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use skiff_core::config::{ProviderConfig, ProviderId};

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    client: Client,
}

impl GeminiProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn complete(
        &self,
        prompt: &str,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            base_url(config, DEFAULT_BASE_URL),
            model(config, DEFAULT_MODEL),
            config.api_key.as_deref().unwrap_or_default(),
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Network(format!("Gemini request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            ProviderError::Network(format!("failed to decode Gemini response: {err}"))
        })?;

        extract_text(parsed)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    response
        .candidates
        .and_then(|mut candidates| {
            if candidates.is_empty() {
                None
            } else {
                candidates.swap_remove(0).content
            }
        })
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.trim().is_empty())
        .ok_or(ProviderError::Empty)
}

fn map_http_error(status: StatusCode, body: String) -> ProviderError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or(body);
    ProviderError::Http {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_candidate_text_wins() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"markdown\":\"ok\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), r#"{"markdown":"ok"}"#);
    }

    #[test]
    fn test_missing_candidates_is_empty() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(extract_text(response), Err(ProviderError::Empty));
    }

    #[test]
    fn test_generation_config_requests_json_mime() {
        let body = GenerateContentRequest {
            contents: vec![],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };
        let rendered = serde_json::to_value(&body).unwrap();
        assert_eq!(
            rendered["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }
}
