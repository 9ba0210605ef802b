//! Wire payloads for the `chat/completions` endpoint.

use serde::{Deserialize, Serialize};

use crate::core::message::Source;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(parts),
        }
    }
}

/// Plain text for ordinary turns, a part array for vision turns.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ImageUrl {
    pub url: String,
    pub detail: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseChoice {
    pub message: ChatResponseMessage,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatResponseChoice>,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vision_content_serializes_as_typed_parts() {
        let message = ChatMessage::user_parts(vec![
            ContentPart::Text {
                text: "Describe".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,AA==".to_string(),
                    detail: "high".to_string(),
                },
            },
        ]);

        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(
            value,
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "Describe"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AA==", "detail": "high"}}
                ]
            })
        );
    }

    #[test]
    fn optional_request_fields_are_omitted() {
        let request = ChatRequest {
            model: "grok-beta".to_string(),
            messages: vec![ChatMessage::system("ping")],
            temperature: None,
            max_tokens: Some(1),
            stream: false,
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert!(value.get("temperature").is_none());
        assert_eq!(value["max_tokens"], 1);
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["content"], "ping");
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"hi"}}]}"#)
                .expect("parse");
        assert_eq!(response.choices.len(), 1);
        assert!(response.choices[0].confidence.is_none());
        assert!(response.sources.is_none());
    }
}
