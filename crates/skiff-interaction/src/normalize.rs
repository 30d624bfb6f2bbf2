//! Fallback-chain parser for unreliable raw model output.
//!
//! Locally hosted models frequently wrap valid JSON in explanatory prose or
//! code fences despite explicit formatting instructions; a single strict
//! parse would discard usable output. Strategies are tried in order, first
//! success wins:
//!
//! 1. parse the whole trimmed reply as JSON;
//! 2. extract a fenced code block and retry;
//! 3. find the first `{...}` span containing the literal key `"markdown"`
//!    and retry;
//! 4. return the cleaned text verbatim as markdown with no suggested
//!    command.
//!
//! An empty raw reply never reaches this module: adapters treat it as a
//! fatal [`ProviderError::Empty`](crate::provider::ProviderError::Empty),
//! which keeps it distinguishable from a valid-but-contentless structured
//! reply.

use once_cell::sync::Lazy;
use regex::Regex;
use skiff_core::ai::AiResponse;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fenced block pattern"));

static EMBEDDED_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)\{.*"markdown".*\}"#).expect("embedded object pattern"));

/// Parses a raw reply that a schema-constrained backend produced.
pub fn parse_structured(raw: &str) -> Result<AiResponse, serde_json::Error> {
    serde_json::from_str(raw.trim())
}

/// Converts free-form model output into the canonical response shape.
/// Total: the last strategy always succeeds.
pub fn normalize_reply(raw: &str) -> AiResponse {
    let trimmed = raw.trim();

    if let Some(response) = parse_candidate(trimmed) {
        return response;
    }

    if let Some(captures) = FENCED_BLOCK.captures(trimmed) {
        if let Some(response) = parse_candidate(captures[1].trim()) {
            return response;
        }
    }

    if let Some(span) = EMBEDDED_OBJECT.find(trimmed) {
        if let Some(response) = parse_candidate(span.as_str()) {
            return response;
        }
    }

    AiResponse::text(cleaned_prose(trimmed))
}

/// Accepts a JSON object that carries a `markdown` string or at least
/// mentions `suggestedCommand` (including an explicit null).
fn parse_candidate(candidate: &str) -> Option<AiResponse> {
    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    let object = value.as_object()?;

    let has_markdown = object.get("markdown").is_some_and(|v| v.is_string());
    let has_command_key = object.contains_key("suggestedCommand");
    if !has_markdown && !has_command_key {
        return None;
    }

    Some(AiResponse {
        markdown: object
            .get("markdown")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        suggested_command: object
            .get("suggestedCommand")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}

/// Strips residual fence markers and leading noise before the first brace
/// or alphabetic character, keeping the rest verbatim.
fn cleaned_prose(raw: &str) -> String {
    let without_fences = raw.replace("```json", "").replace("```", "");
    let trimmed = without_fences.trim();
    let start = trimmed
        .find(|c: char| c.is_alphabetic() || c == '{')
        .unwrap_or(0);
    trimmed[start..].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_reply_parses_directly() {
        let response = normalize_reply(r#"{"markdown":"Use tail -f.","suggestedCommand":"tail -f /var/log/syslog"}"#);
        assert_eq!(response.markdown, "Use tail -f.");
        assert_eq!(
            response.suggested_command.as_deref(),
            Some("tail -f /var/log/syslog")
        );
    }

    #[test]
    fn test_fenced_json_is_unwrapped() {
        let response = normalize_reply("```json\n{\"markdown\":\"Test\",\"suggestedCommand\":null}\n```");
        assert_eq!(response.markdown, "Test");
        assert_eq!(response.suggested_command, None);
    }

    #[test]
    fn test_fenced_json_without_language_tag() {
        let response = normalize_reply("```\n{\"markdown\":\"Fine\"}\n```");
        assert_eq!(response.markdown, "Fine");
    }

    #[test]
    fn test_json_buried_in_prose_is_extracted() {
        let raw = "Sure! Here is the answer you asked for:\n{\"markdown\":\"Run df -h.\",\"suggestedCommand\":\"df -h\"}\nHope that helps.";
        let response = normalize_reply(raw);
        assert_eq!(response.markdown, "Run df -h.");
        assert_eq!(response.suggested_command.as_deref(), Some("df -h"));
    }

    #[test]
    fn test_plain_prose_passes_through_unchanged() {
        let prose = "You can list open ports with ss -tlnp.";
        let response = normalize_reply(prose);
        assert_eq!(response.markdown, prose);
        assert_eq!(response.suggested_command, None);
    }

    #[test]
    fn test_leading_punctuation_is_stripped_from_prose() {
        let response = normalize_reply(">>> ok, so: nothing to fix here");
        assert_eq!(response.markdown, "ok, so: nothing to fix here");
    }

    #[test]
    fn test_null_suggested_command_stays_none() {
        let response = normalize_reply(r#"{"markdown":"Test","suggestedCommand":null}"#);
        assert_eq!(response.markdown, "Test");
        assert_eq!(response.suggested_command, None);
    }

    #[test]
    fn test_object_with_only_suggested_command_is_accepted() {
        let response = normalize_reply(r#"{"suggestedCommand":"ls -la"}"#);
        assert_eq!(response.markdown, "");
        assert_eq!(response.suggested_command.as_deref(), Some("ls -la"));
    }

    #[test]
    fn test_unrelated_json_falls_back_to_prose() {
        // Valid JSON, wrong shape: treated as text, not as a reply object.
        let raw = r#"{"answer":"42"}"#;
        let response = normalize_reply(raw);
        assert_eq!(response.markdown, raw);
    }

    #[test]
    fn test_structured_parse_accepts_bare_object() {
        let response = parse_structured(r#"{"markdown":"done","suggestedCommand":"make clean"}"#).unwrap();
        assert_eq!(response.suggested_command.as_deref(), Some("make clean"));
        assert!(parse_structured("not json at all").is_err());
    }
}
