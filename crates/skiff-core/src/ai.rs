//! Canonical AI request/response shapes.
//!
//! Every provider path converges to [`AiResponse`]; the gateway in
//! `skiff-interaction` guarantees it, converting every failure into a
//! diagnostic response rather than an error.

use serde::{Deserialize, Serialize};

/// One assistant invocation. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequest {
    /// The user's question, or the candidate command line in correction mode.
    pub query: String,
    /// Visible terminal buffer excerpt supplied as context. May be empty.
    #[serde(default)]
    pub context_snippet: String,
    /// Provider identifier as selected in the UI. Validated by the gateway;
    /// an unknown value yields a diagnostic response, not an error.
    pub provider: String,
}

/// The single canonical reply shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub suggested_command: Option<String>,
}

impl AiResponse {
    /// A markdown-only response with no suggested command.
    pub fn text(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            suggested_command: None,
        }
    }
}
