//! Normalizing provider responses into replies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ChatResponse;
use crate::core::gateway::error::GatewayError;
use crate::core::message::{MessageMetadata, Source};

pub const DEFAULT_THOUGHT_MARKER: &str = "思考过程：";
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Provider conventions that are not part of the API contract.
///
/// Neither is versioned by the provider, so both are configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseConventions {
    /// Text that introduces the model's reasoning inside the answer.
    pub thought_marker: String,
    /// Confidence reported when the provider sends none.
    pub default_confidence: f64,
}

impl Default for ResponseConventions {
    fn default() -> Self {
        Self {
            thought_marker: DEFAULT_THOUGHT_MARKER.to_string(),
            default_confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// A successful model answer.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub content: String,
    pub thought_process: Option<String>,
    pub confidence_score: f64,
    pub sources: Vec<Source>,
    /// Model the request was actually sent to.
    pub model_used: String,
    pub latency: Duration,
}

impl TurnReply {
    pub fn metadata(&self) -> MessageMetadata {
        MessageMetadata {
            thought_process: self.thought_process.clone(),
            confidence_score: Some(self.confidence_score),
            sources: self.sources.clone(),
        }
    }
}

/// Text following `marker`, up to the next blank line or the end.
pub fn extract_thought_process(content: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    let start = content.find(marker)? + marker.len();
    let rest = &content[start..];
    let end = rest.find("\n\n").unwrap_or(rest.len());
    let thought = rest[..end].trim();
    if thought.is_empty() {
        None
    } else {
        Some(thought.to_string())
    }
}

pub fn into_reply(
    response: ChatResponse,
    conventions: &ResponseConventions,
    model_used: String,
    latency: Duration,
) -> Result<TurnReply, GatewayError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::MalformedResponse("no choices returned".to_string()))?;
    let content = choice.message.content.unwrap_or_default();
    let thought_process = extract_thought_process(&content, &conventions.thought_marker);
    let confidence_score = choice
        .confidence
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 1.0))
        .unwrap_or(conventions.default_confidence);

    Ok(TurnReply {
        content,
        thought_process,
        confidence_score,
        sources: response.sources.unwrap_or_default(),
        model_used,
        latency,
    })
}
