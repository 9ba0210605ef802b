use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::message::Message;

pub const DEFAULT_SESSION_TITLE: &str = "New chat";
pub const PREVIEW_MAX_CHARS: usize = 50;
pub const TITLE_MAX_CHARS: usize = 20;

/// Opaque session identifier derived from the creation time in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Milliseconds encoded in the id, when it was generated by this crate.
    pub fn millis(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: DEFAULT_SESSION_TITLE.to_string(),
            preview: String::new(),
            messages: Vec::new(),
            created_at,
        }
    }

    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }

    /// Title shown in lists; falls back to the default for blank titles.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_SESSION_TITLE
        } else {
            &self.title
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.preview = preview_for(&message.content);
        self.messages.push(message);
    }
}

/// Keep the first `max_chars` characters, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

pub fn preview_for(content: &str) -> String {
    truncate_with_ellipsis(content, PREVIEW_MAX_CHARS)
}

/// Local title used whenever the model cannot provide one.
pub fn fallback_title(seed: &str) -> String {
    truncate_with_ellipsis(seed.trim(), TITLE_MAX_CHARS)
}

/// Normalize a model-suggested title: trim, drop quote marks, cap the length.
pub fn clean_generated_title(raw: &str) -> Option<String> {
    let stripped: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’'))
        .collect();
    let capped: String = stripped.trim().chars().take(TITLE_MAX_CHARS).collect();
    let capped = capped.trim().to_string();
    if capped.is_empty() {
        None
    } else {
        Some(capped)
    }
}
