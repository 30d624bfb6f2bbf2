//! The AI gateway.
//!
//! One normalized request/response contract over six heterogeneous
//! backends. `dispatch` never fails: configuration problems, transport
//! failures and parse failures all come back as an [`AiResponse`] whose
//! markdown carries a human-readable diagnostic.

use crate::normalize::{normalize_reply, parse_structured};
use crate::prompt::{build_ask_prompt, build_correction_prompt};
use crate::provider::{ProviderAdapter, ResponseMode};
use crate::providers::{
    AnthropicProvider, GeminiProvider, GroqProvider, OllamaProvider, OpenAiProvider,
    OpenRouterProvider,
};
use reqwest::Client;
use skiff_core::ai::{AiRequest, AiResponse};
use skiff_core::config::{ProviderConfig, ProviderId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const UNKNOWN_PROVIDER: &str = "Unknown provider selected.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Selects the active provider adapter, validates its configuration, and
/// converts every failure into a diagnostic response.
pub struct AiGateway {
    providers: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
}

impl AiGateway {
    /// Builds a gateway over an explicit adapter set. Used directly by
    /// tests; production code goes through [`AiGateway::with_default_providers`].
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        let providers = adapters
            .into_iter()
            .map(|adapter| (adapter.id(), adapter))
            .collect();
        Self { providers }
    }

    /// Registers all six backend adapters over one shared HTTP client.
    pub fn with_default_providers() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::new(vec![
            Arc::new(OpenAiProvider::new(client.clone())),
            Arc::new(AnthropicProvider::new(client.clone())),
            Arc::new(GeminiProvider::new(client.clone())),
            Arc::new(GroqProvider::new(client.clone())),
            Arc::new(OpenRouterProvider::new(client.clone())),
            Arc::new(OllamaProvider::new(client)),
        ])
    }

    /// Free-form query mode: answers a question with the session's visible
    /// buffer as context.
    pub async fn ask(&self, request: &AiRequest, config: &ProviderConfig) -> AiResponse {
        let prompt = build_ask_prompt(&request.query, &request.context_snippet);
        self.dispatch(&request.provider, &prompt, config).await
    }

    /// Auto-correct mode: validates or fixes a single candidate command
    /// line through the same per-provider transport path.
    pub async fn correct_command(
        &self,
        command_line: &str,
        provider: &str,
        config: &ProviderConfig,
    ) -> AiResponse {
        let prompt = build_correction_prompt(command_line);
        self.dispatch(provider, &prompt, config).await
    }

    /// Shared dispatch path. Infallible by contract.
    async fn dispatch(&self, provider: &str, prompt: &str, config: &ProviderConfig) -> AiResponse {
        let Ok(id) = provider.parse::<ProviderId>() else {
            tracing::warn!("[AiGateway] unknown provider '{}'", provider);
            return AiResponse::text(UNKNOWN_PROVIDER);
        };
        let Some(adapter) = self.providers.get(&id) else {
            tracing::warn!("[AiGateway] no adapter registered for '{}'", id);
            return AiResponse::text(UNKNOWN_PROVIDER);
        };

        if !config.enabled {
            return AiResponse::text(format!(
                "Configuration Error: provider {id} is disabled in Settings."
            ));
        }

        let has_key = config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if adapter.requires_api_key() && !has_key {
            return AiResponse::text(format!(
                "Configuration Error: Missing API Key for {id}. Set it in Settings before using the assistant."
            ));
        }

        tracing::info!(
            "[AiGateway] dispatching to {} ({} prompt bytes)",
            id,
            prompt.len()
        );

        match adapter.complete(prompt, config).await {
            Ok(raw) => match adapter.response_mode() {
                ResponseMode::Structured => parse_structured(&raw).unwrap_or_else(|err| {
                    tracing::warn!("[AiGateway] {} returned malformed JSON: {}", id, err);
                    AiResponse::text(format!("Error parsing response from {id}: {err}"))
                }),
                ResponseMode::FreeForm => normalize_reply(&raw),
            },
            Err(err) => {
                tracing::warn!("[AiGateway] {} call failed: {}", id, err);
                AiResponse::text(format!("Error connecting to {id}: {err}"))
            }
        }
    }
}
