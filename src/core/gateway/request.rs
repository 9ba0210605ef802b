//! Request shaping for turns, credential probes and health pings.

use crate::api::{ChatMessage, ChatRequest, ContentPart, ImageUrl};
use crate::core::image::PendingImage;
use crate::core::style::StyleProfile;

/// Prompt sent with an image when the user typed nothing.
pub const DEFAULT_IMAGE_PROMPT: &str = "please analyze this image";
pub const IMAGE_DETAIL: &str = "high";
pub const VISION_MAX_TOKENS: u32 = 2048;

pub const PROBE_SYSTEM_PROMPT: &str = "You are a test assistant.";
pub const PROBE_USER_PROMPT: &str = "Test connection.";
pub const HEALTH_PING: &str = "ping";

/// Build the request for one user turn.
///
/// An attached image forces `vision_model`, whatever `selected_model` is.
pub fn turn_request(
    text: &str,
    image: Option<&PendingImage>,
    style: StyleProfile,
    selected_model: &str,
    vision_model: &str,
) -> ChatRequest {
    let system = ChatMessage::system(style.system_prompt());

    match image {
        Some(image) => {
            let prompt = if text.trim().is_empty() {
                DEFAULT_IMAGE_PROMPT.to_string()
            } else {
                text.to_string()
            };
            ChatRequest {
                model: vision_model.to_string(),
                messages: vec![
                    system,
                    ChatMessage::user_parts(vec![
                        ContentPart::Text { text: prompt },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image.data.clone(),
                                detail: IMAGE_DETAIL.to_string(),
                            },
                        },
                    ]),
                ],
                temperature: Some(style.temperature()),
                max_tokens: Some(VISION_MAX_TOKENS),
                stream: false,
            }
        }
        None => ChatRequest {
            model: selected_model.to_string(),
            messages: vec![system, ChatMessage::user(text)],
            temperature: Some(style.temperature()),
            max_tokens: None,
            stream: false,
        },
    }
}

/// Fixed, innocuous request used to check whether a credential is accepted.
pub fn credential_probe(model: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(PROBE_SYSTEM_PROMPT),
            ChatMessage::user(PROBE_USER_PROMPT),
        ],
        temperature: Some(0.0),
        max_tokens: None,
        stream: false,
    }
}

/// Cheapest possible request against the selected model.
pub fn health_ping(model: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(HEALTH_PING)],
        temperature: None,
        max_tokens: Some(1),
        stream: false,
    }
}

/// Prompt asking the model to name a conversation.
pub fn title_prompt(seed: &str) -> String {
    format!(
        "Generate a short title (no more than 20 characters) for the following conversation:\n\"{seed}\""
    )
}

pub fn title_request(seed: &str, model: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user(title_prompt(seed))],
        temperature: None,
        max_tokens: None,
        stream: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MessageContent;

    fn sample_image() -> PendingImage {
        PendingImage {
            data: "data:image/jpeg;base64,/9j/".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn text_turn_uses_selected_model_and_style() {
        let request = turn_request("Hello", None, StyleProfile::Concise, "grok-beta", "grok-vision-beta");

        assert_eq!(request.model, "grok-beta");
        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.max_tokens, None);
        assert!(!request.stream);
        assert_eq!(
            request.messages,
            vec![
                ChatMessage::system(StyleProfile::Concise.system_prompt()),
                ChatMessage::user("Hello"),
            ]
        );
    }

    #[test]
    fn image_turn_forces_vision_model() {
        for selected in ["grok-beta", "grok-2", "grok-vision-beta"] {
            let request = turn_request(
                "What is this?",
                Some(&sample_image()),
                StyleProfile::Friendly,
                selected,
                "grok-vision-beta",
            );
            assert_eq!(request.model, "grok-vision-beta");
            assert_eq!(request.max_tokens, Some(VISION_MAX_TOKENS));
            assert_eq!(request.temperature, Some(0.8));
        }
    }

    #[test]
    fn image_turn_without_text_uses_default_prompt() {
        let request = turn_request(
            "   ",
            Some(&sample_image()),
            StyleProfile::Professional,
            "grok-beta",
            "grok-vision-beta",
        );

        let MessageContent::Parts(parts) = &request.messages[1].content else {
            panic!("vision turns carry content parts");
        };
        assert_eq!(
            parts[0],
            ContentPart::Text {
                text: DEFAULT_IMAGE_PROMPT.to_string()
            }
        );
        assert_eq!(
            parts[1],
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/jpeg;base64,/9j/".to_string(),
                    detail: "high".to_string(),
                }
            }
        );
        assert_eq!(
            request.messages[0],
            ChatMessage::system(StyleProfile::Professional.system_prompt())
        );
    }

    #[test]
    fn probes_are_minimal() {
        let probe = credential_probe("grok-beta");
        assert_eq!(probe.temperature, Some(0.0));
        assert_eq!(probe.messages.len(), 2);

        let ping = health_ping("grok-2");
        assert_eq!(ping.model, "grok-2");
        assert_eq!(ping.max_tokens, Some(1));
        assert_eq!(ping.messages, vec![ChatMessage::system(HEALTH_PING)]);
    }
}
