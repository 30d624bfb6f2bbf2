//! The provider capability interface.
//!
//! One implementation per backend, registered in the gateway's lookup table.
//! Adding a backend means adding one implementation, not editing a central
//! conditional.

use async_trait::async_trait;
use skiff_core::config::{ProviderConfig, ProviderId};
use thiserror::Error;

/// Failure of a single provider call.
///
/// None of these are retried automatically; each surfaces as one diagnostic
/// response at the gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Payload present but the content field was empty. Fatal for the call.
    #[error("provider returned an empty response")]
    Empty,

    /// Non-success HTTP status, with whatever message the backend's error
    /// envelope carried.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport-level failure (unreachable host, timeout, bad payload).
    #[error("{0}")]
    Network(String),
}

/// Whether the backend's reply can be parsed as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// The backend honors a strict JSON response format natively; the raw
    /// reply is parsed directly.
    Structured,
    /// The backend is only coached via prompt instructions and may wrap its
    /// JSON in prose or code fences; the reply goes through the fallback
    /// normalizer.
    FreeForm,
}

/// Translation layer from a canonical prompt to one backend's wire format.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Whether a configured API key is a precondition for dispatch.
    /// Locally-hosted backends permit anonymous use.
    fn requires_api_key(&self) -> bool {
        true
    }

    fn response_mode(&self) -> ResponseMode {
        ResponseMode::Structured
    }

    /// Sends the prompt and returns the backend's raw reply text.
    async fn complete(
        &self,
        prompt: &str,
        config: &ProviderConfig,
    ) -> Result<String, ProviderError>;
}

/// Resolves the effective base URL, trimming a trailing slash so adapters
/// can join paths uniformly.
pub(crate) fn base_url<'a>(config: &'a ProviderConfig, default: &'a str) -> &'a str {
    config
        .base_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
}

/// Resolves the effective model name.
pub(crate) fn model<'a>(config: &'a ProviderConfig, default: &'a str) -> &'a str {
    config
        .model
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(default)
}
