use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::image::PendingImage;

/// Alt text used when an uploaded image is embedded in a user turn.
pub const IMAGE_EMBED_ALT: &str = "Uploaded Image";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    // Older history files wrote assistant turns as "ai".
    #[serde(alias = "ai")]
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" | "ai" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

/// A reference the provider cited for an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.thought_process.is_none() && self.confidence_score.is_none() && self.sources.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach metadata, dropping it entirely when nothing was provided.
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = if metadata.is_empty() {
            None
        } else {
            Some(metadata)
        };
        self
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }

    /// The typed part of the message, without any embedded image reference.
    pub fn text_without_image(&self) -> &str {
        strip_image_embed(&self.content)
    }
}

/// Build the stored content of a user turn.
///
/// An attached image is embedded as a markdown image after the text so the
/// transcript keeps a reference to it.
pub fn compose_user_content(text: &str, image: Option<&PendingImage>) -> String {
    match image {
        Some(image) => format!("{text}\n\n![{IMAGE_EMBED_ALT}]({})", image.data),
        None => text.to_string(),
    }
}

fn strip_image_embed(content: &str) -> &str {
    let marker = format!("![{IMAGE_EMBED_ALT}](");
    match content.find(&marker) {
        Some(index) => content[..index].trim_end(),
        None => content,
    }
}
